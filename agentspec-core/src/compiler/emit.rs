//! Program text emission.
//!
//! Emits a vitest program that drives the agent through the `ai` SDK. Each
//! benchmark case becomes one `test(..)` block; the preamble (imports,
//! provided values, schema declarations, agent constants) is shared.

use crate::spec::{BenchmarkCase, Specification, ToolDef};
use super::escape::{comment_text, string_literal};
use super::validators::{object_validator, validator};
use super::CompileError;

/// Environment variable the generated program reads provided values from.
pub const PROVIDED_VALUES_ENV: &str = "AGENTSPEC_PROVIDED";

/// Provider used when a model id carries no `provider:` prefix.
const DEFAULT_MODEL_PROVIDER: &str = "openai";

/// Qualify a bare model id with the default provider.
pub fn qualified_model(model: &str) -> String {
    if model.contains(':') {
        model.to_string()
    } else {
        format!("{}:{}", DEFAULT_MODEL_PROVIDER, model)
    }
}

pub(crate) fn header(spec: &Specification) -> String {
    format!(
        "// Generated by agentspec from {} v{}. Do not edit.\n",
        comment_text(&spec.metadata.name),
        comment_text(&spec.metadata.version)
    )
}

pub(crate) fn preamble(spec: &Specification) -> String {
    let mut out = String::new();

    out.push_str("import { describe, expect, test } from \"vitest\";\n");
    out.push_str(
        "import { createProviderRegistry, generateObject, generateText, tool } from \"ai\";\n",
    );
    out.push_str("import { anthropic } from \"@ai-sdk/anthropic\";\n");
    out.push_str("import { openai } from \"@ai-sdk/openai\";\n");
    out.push_str("import { z } from \"zod\";\n\n");

    out.push_str("const registry = createProviderRegistry({ anthropic, openai });\n");
    out.push_str(&format!(
        "const provided: Record<string, unknown> = JSON.parse(process.env.{} ?? \"{{}}\");\n\n",
        PROVIDED_VALUES_ENV
    ));

    out.push_str(&format!(
        "const MODEL = {};\n",
        string_literal(&qualified_model(&spec.agent.model))
    ));
    out.push_str(&format!(
        "const SYSTEM_PROMPT: string =\n  typeof provided.systemPrompt === \"string\"\n    ? provided.systemPrompt\n    : {};\n\n",
        string_literal(&spec.agent.system_prompt)
    ));

    out.push_str("const schemas = {\n");
    for (name, schema) in &spec.schemas {
        out.push_str(&format!("  {}: {},\n", string_literal(name), validator(schema)));
    }
    out.push_str("};\n");

    out
}

fn tool_declaration(
    spec: &Specification,
    case: &BenchmarkCase,
    name: &str,
    tool: &ToolDef,
) -> Result<String, CompileError> {
    if !spec.schemas.contains_key(&tool.output) {
        return Err(CompileError::UnresolvedSchema {
            owner: format!("tool '{}'", name),
            schema: tool.output.clone(),
        });
    }

    let (prompt, model) = match &tool.generator {
        Some(generator_name) => {
            let generator = spec.generators.get(generator_name).ok_or_else(|| {
                CompileError::UnresolvedGenerator {
                    tool: name.to_string(),
                    generator: generator_name.clone(),
                }
            })?;
            (
                generator.prompt.clone(),
                generator.model.as_deref().map(qualified_model),
            )
        }
        None => (
            format!(
                "Simulate the tool \"{}\" ({}) for benchmark \"{}\". Produce a realistic result.",
                name, tool.description, case.name
            ),
            None,
        ),
    };
    let model = match model {
        Some(model) => string_literal(&model),
        None => "MODEL".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("      {}: tool({{\n", string_literal(name)));
    out.push_str(&format!(
        "        description: {},\n",
        string_literal(&tool.description)
    ));
    out.push_str(&format!(
        "        parameters: {},\n",
        object_validator(&tool.input)
    ));
    out.push_str("        execute: async (input) => {\n");
    out.push_str("          const { object } = await generateObject({\n");
    out.push_str(&format!("            model: registry.languageModel({}),\n", model));
    out.push_str(&format!(
        "            schema: schemas[{}],\n",
        string_literal(&tool.output)
    ));
    out.push_str(&format!(
        "            prompt: {} + \"\\n\\nTool input:\\n\" + JSON.stringify(input),\n",
        string_literal(&prompt)
    ));
    out.push_str("          });\n");
    out.push_str("          return object;\n");
    out.push_str("        },\n");
    out.push_str("      }),\n");
    Ok(out)
}

/// Emit the `test(..)` block for one benchmark case.
pub(crate) fn case_block(spec: &Specification, case: &BenchmarkCase) -> Result<String, CompileError> {
    let driving_input = case
        .first_user_message()
        .ok_or_else(|| CompileError::MissingUserMessage(case.name.clone()))?;

    if !spec.schemas.contains_key(&case.judge.schema) {
        return Err(CompileError::UnresolvedSchema {
            owner: format!("benchmark '{}'", case.name),
            schema: case.judge.schema.clone(),
        });
    }

    let mut tools = String::new();
    for tool_name in &case.tools {
        let tool = spec
            .tools
            .get(tool_name)
            .ok_or_else(|| CompileError::UnresolvedTool {
                benchmark: case.name.clone(),
                tool: tool_name.clone(),
            })?;
        tools.push_str(&tool_declaration(spec, case, tool_name, tool)?);
    }

    let judge_model = match &case.judge.model {
        Some(model) => string_literal(&qualified_model(model)),
        None => "MODEL".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "  test({}, async ({{ task }}) => {{\n",
        string_literal(&case.name)
    ));
    out.push_str(&format!("    const prompt = {};\n", string_literal(driving_input)));

    if case.tools.is_empty() {
        out.push_str("    const tools = {};\n\n");
    } else {
        out.push_str("    const tools = {\n");
        out.push_str(&tools);
        out.push_str("    };\n\n");
    }

    out.push_str("    const result = await generateText({\n");
    out.push_str("      model: registry.languageModel(MODEL),\n");
    out.push_str("      system: SYSTEM_PROMPT,\n");
    out.push_str("      prompt,\n");
    out.push_str("      tools,\n");
    if !case.tools.is_empty() {
        out.push_str(&format!(
            "      toolChoice: {},\n",
            string_literal(spec.agent.tool_choice.as_str())
        ));
    }
    if let Some(max_steps) = spec.agent.max_steps {
        out.push_str(&format!("      maxSteps: {},\n", max_steps));
    }
    out.push_str("    });\n\n");

    out.push_str("    const meta = task.meta as Record<string, unknown>;\n");
    out.push_str(
        "    meta.response = { prompt, systemPrompt: SYSTEM_PROMPT, text: result.text };\n\n",
    );

    out.push_str("    const { object } = await generateObject({\n");
    out.push_str(&format!("      model: registry.languageModel({}),\n", judge_model));
    out.push_str(&format!(
        "      schema: schemas[{}],\n",
        string_literal(&case.judge.schema)
    ));
    out.push_str(&format!(
        "      prompt:\n        {} +\n        \"\\n\\nAgent result:\\n\" +\n        JSON.stringify({{\n          text: result.text,\n          toolCalls: result.toolCalls,\n          toolResults: result.toolResults,\n          finishReason: result.finishReason,\n        }}),\n",
        string_literal(&case.judge.prompt)
    ));
    out.push_str("    });\n");
    out.push_str("    const verdict = object as Record<string, any>;\n");
    out.push_str("    meta.verdict = verdict;\n\n");
    out.push_str("    expect(verdict.passed, verdict.feedback).toBe(true);\n");
    if let Some(min_score) = case.judge.min_score {
        out.push_str(&format!(
            "    expect(verdict.score).toBeGreaterThanOrEqual({:?});\n",
            min_score
        ));
    }
    out.push_str("  });\n");

    Ok(out)
}

/// Wrap test blocks in the suite's `describe(..)`.
pub(crate) fn suite(spec: &Specification, blocks: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "describe({}, () => {{\n",
        string_literal(&spec.metadata.name)
    ));
    out.push_str(&blocks.join("\n"));
    out.push_str("});\n");
    out
}
