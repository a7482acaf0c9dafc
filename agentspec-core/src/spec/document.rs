//! Specification documents on disk.
//!
//! YAML and JSON are supported; the format follows the file extension.

use std::path::Path;

use tracing::debug;

use crate::Result;
use super::types::Specification;

/// Document encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a path's extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse a specification document without validating it.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Specification> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    })
}

/// Parse and validate a specification document.
pub fn parse_specification(text: &str, format: DocumentFormat) -> Result<Specification> {
    let spec = parse_document(text, format)?;
    spec.validate()?;
    Ok(spec)
}

/// Read, parse and validate a specification file.
pub fn load_specification(path: impl AsRef<Path>) -> Result<Specification> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let spec = parse_specification(&text, DocumentFormat::from_path(path))?;
    debug!(
        path = %path.display(),
        benchmarks = spec.benchmarks.len(),
        tools = spec.tools.len(),
        "Loaded specification"
    );
    Ok(spec)
}

/// Render a specification in the given document format.
pub fn render_specification(spec: &Specification, format: DocumentFormat) -> Result<String> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::to_string(spec)?,
        DocumentFormat::Json => {
            let mut text = serde_json::to_string_pretty(spec)?;
            text.push('\n');
            text
        }
    })
}

/// Write a specification snapshot, creating parent directories as needed.
pub fn save_specification(path: impl AsRef<Path>, spec: &Specification) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let text = render_specification(spec, DocumentFormat::from_path(path))?;
    std::fs::write(path, text)?;
    debug!(path = %path.display(), "Saved specification snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    const DOC: &str = r#"
metadata:
  name: echo
  version: 2.0.0
schemas:
  Verdict:
    type: object
    properties:
      passed:
        type: boolean
      feedback:
        type: string
agent:
  model: gpt-4o-mini
  systemPrompt: "Repeat the user.\n  Keep \"quotes\" intact."
benchmarks:
  - name: repeat
    messages:
      - role: user
        content: hello
    judge:
      prompt: Did it repeat?
      schema: Verdict
      minScore: 0.5
optimizer:
  iterations: 4
  minPassRate: 80
  strategy: completion
"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("agent")), DocumentFormat::Yaml);
    }

    #[test]
    fn test_parse_yaml_document() {
        let spec = parse_specification(DOC, DocumentFormat::Yaml).unwrap();
        assert_eq!(spec.metadata.version, "2.0.0");
        assert_eq!(spec.system_prompt(), "Repeat the user.\n  Keep \"quotes\" intact.");
        assert_eq!(spec.benchmarks[0].judge.min_score, Some(0.5));

        let optimizer = spec.optimizer.as_ref().unwrap();
        assert_eq!(optimizer.iterations, Some(4));
        assert_eq!(optimizer.min_pass_rate, Some(80.0));
        assert_eq!(optimizer.strategy.as_deref(), Some("completion"));
    }

    #[test]
    fn test_parse_rejects_invalid_references() {
        let broken = DOC.replace("schema: Verdict", "schema: Nope");
        let err = parse_specification(&broken, DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_parse_document_skips_validation() {
        let broken = DOC.replace("schema: Verdict", "schema: Nope");
        let spec = parse_document(&broken, DocumentFormat::Yaml).unwrap();
        assert_eq!(spec.problems().len(), 1);
    }

    #[test]
    fn test_save_and_load_preserves_document() {
        let dir = tempdir().unwrap();
        let spec = parse_specification(DOC, DocumentFormat::Yaml).unwrap();

        for name in ["snapshot.yaml", "nested/snapshot.json"] {
            let path = dir.path().join(name);
            save_specification(&path, &spec).unwrap();
            let loaded = load_specification(&path).unwrap();
            assert_eq!(loaded, spec);
        }
    }
}
