//! Command-backed inference provider.
//!
//! Runs a local command line per request. The prompt is written to stdin
//! and the reply is read from stdout. `{model}` in the command line expands
//! to the requested model id.

use async_trait::async_trait;
use serde_json::Value;

use super::{
    InferenceProvider, StructuredRequest, StructuredResponse, TextRequest, TextResponse, Usage,
};
use crate::config::ProviderConfig;
use crate::utils::{run_command, strip_code_fences, CommandOptions};
use crate::{Error, Result};

pub struct CommandProvider {
    config: ProviderConfig,
}

impl CommandProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn command_line(&self, model: &str) -> Vec<String> {
        self.config
            .command
            .iter()
            .map(|arg| arg.replace("{model}", model))
            .collect()
    }

    async fn complete(&self, model: &str, input: &str) -> Result<String> {
        let argv = self.command_line(model);
        let output = run_command(
            &argv,
            CommandOptions {
                stdin: Some(input),
                timeout_secs: self.config.timeout_secs,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::provider(format!("{:#}", e)))?;

        if !output.success {
            return Err(Error::provider(format!(
                "provider command exited with {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Build the stdin document for a text request.
fn text_input(request: &TextRequest) -> String {
    match &request.system {
        Some(system) if !system.trim().is_empty() => {
            format!("{}\n\n{}", system.trim_end(), request.prompt)
        }
        _ => request.prompt.clone(),
    }
}

/// Build the stdin document for a structured request.
fn structured_input(request: &StructuredRequest) -> String {
    format!(
        "{}\n\nRespond with only a JSON value matching this JSON Schema:\n{}",
        request.prompt, request.schema
    )
}

/// Parse the first JSON value in a reply, ignoring code fences and any
/// trailing chatter.
fn parse_structured(reply: &str) -> Result<Value> {
    let body = strip_code_fences(reply);
    let start = body
        .find(['{', '['])
        .ok_or_else(|| Error::provider("reply contains no JSON value"))?;

    let mut values = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(Error::provider(format!("reply is not valid JSON: {}", e))),
        None => Err(Error::provider("reply contains no JSON value")),
    }
}

#[async_trait]
impl InferenceProvider for CommandProvider {
    fn name(&self) -> &str {
        "command"
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        if !request.tools.is_empty() {
            tracing::warn!(tools = ?request.tools, "Tool calling requested from command provider");
            return Err(Error::provider(
                "the command provider does not support tool calling",
            ));
        }

        let text = self.complete(&request.model, &text_input(request)).await?;
        Ok(TextResponse {
            text: text.trim().to_string(),
            usage: Usage::default(),
        })
    }

    async fn generate_structured(&self, request: &StructuredRequest) -> Result<StructuredResponse> {
        let reply = self
            .complete(&request.model, &structured_input(request))
            .await?;
        Ok(StructuredResponse {
            object: parse_structured(&reply)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cat_provider() -> CommandProvider {
        CommandProvider::new(ProviderConfig {
            command: vec!["cat".into()],
            timeout_secs: 30,
        })
    }

    #[test]
    fn test_command_line_expands_model() {
        let provider = CommandProvider::new(ProviderConfig::default());
        assert_eq!(provider.command_line("gpt-4o"), vec!["llm", "-m", "gpt-4o"]);
    }

    #[test]
    fn test_text_input_prepends_system() {
        let request = TextRequest::new("m", "Fix it").with_system("You edit prompts.\n");
        assert_eq!(text_input(&request), "You edit prompts.\n\nFix it");
        assert_eq!(text_input(&TextRequest::new("m", "Fix it")), "Fix it");
    }

    #[test]
    fn test_parse_structured() {
        assert_eq!(
            parse_structured("```json\n{\"passed\": true}\n```").unwrap(),
            json!({"passed": true})
        );
        assert_eq!(
            parse_structured("Sure! {\"score\": 0.5} hope that helps").unwrap(),
            json!({"score": 0.5})
        );
        assert!(parse_structured("no json here").unwrap_err().is_provider());
        assert!(parse_structured("{broken").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_text_via_command() {
        let response = cat_provider()
            .generate_text(&TextRequest::new("m", "hello world\n"))
            .await
            .unwrap();
        assert_eq!(response.text, "hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_structured_via_command() {
        let provider = CommandProvider::new(ProviderConfig {
            command: vec!["sh".into(), "-c".into(), "cat >/dev/null; echo '{\"ok\": true}'".into()],
            timeout_secs: 30,
        });
        let response = provider
            .generate_structured(&StructuredRequest {
                model: "m".into(),
                prompt: "Return ok".into(),
                schema: json!({"type": "object"}),
            })
            .await
            .unwrap();
        assert_eq!(response.object, json!({"ok": true}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_provider_error() {
        let provider = CommandProvider::new(ProviderConfig {
            command: vec!["false".into()],
            timeout_secs: 30,
        });
        let err = provider
            .generate_text(&TextRequest::new("m", "x"))
            .await
            .unwrap_err();
        assert!(err.is_provider());
    }

    #[tokio::test]
    async fn test_tools_are_rejected() {
        let mut request = TextRequest::new("m", "x");
        request.tools.push("get_forecast".into());
        let err = cat_provider().generate_text(&request).await.unwrap_err();
        assert!(err.is_provider());
    }
}
