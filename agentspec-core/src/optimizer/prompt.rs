//! Improvement request templates.

use crate::compiler::render_template;
use super::feedback::FeedbackDocument;

/// System prompt for the improving model.
pub const IMPROVER_SYSTEM_PROMPT: &str = "You are an expert prompt engineer. You rewrite system prompts for AI agents so that they pass their benchmark tests. Reply with the improved system prompt only, without commentary or code fences.";

/// Default improvement instruction. Placeholders: `{{currentPrompt}}`,
/// `{{testResults}}`, `{{responseData}}`.
pub const DEFAULT_IMPROVEMENT_TEMPLATE: &str = r#"The following system prompt is used by an AI agent:

<current_prompt>
{{currentPrompt}}
</current_prompt>

The agent was run against its benchmark cases. Each case was judged by an evaluator.

<test_results>
{{testResults}}
</test_results>

<responses>
{{responseData}}
</responses>

Rewrite the system prompt so that the failing cases pass while the passing cases keep passing. Keep instructions that already work, fix the behaviours the evaluator criticised, and do not mention the tests or the evaluator in the prompt."#;

/// Render an improvement request from `template`.
pub fn improvement_request(template: &str, current_prompt: &str, feedback: &FeedbackDocument) -> String {
    render_template(template, |key| match key {
        "currentPrompt" => Some(current_prompt.to_string()),
        "testResults" => Some(feedback.test_results.clone()),
        "responseData" => Some(feedback.response_data.clone()),
        _ => None,
    })
}
