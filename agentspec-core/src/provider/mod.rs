//! Inference Provider
//!
//! The text and structured-object generation capability the optimizer uses
//! to request improved prompts. [`CommandProvider`] shells out to a local
//! command; [`MockProvider`] replays scripted replies.

mod command;
mod mock;

pub use command::CommandProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// A plain text generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub prompt: String,
    /// Names of tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Token accounting, when the provider reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
    #[serde(default)]
    pub usage: Usage,
}

/// A request for a value conforming to a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequest {
    pub model: String,
    pub prompt: String,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub object: Value,
}

/// Text and structured-object generation.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse>;

    async fn generate_structured(&self, request: &StructuredRequest) -> Result<StructuredResponse>;
}

#[async_trait]
impl<T: InferenceProvider + ?Sized> InferenceProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        (**self).generate_text(request).await
    }

    async fn generate_structured(&self, request: &StructuredRequest) -> Result<StructuredResponse> {
        (**self).generate_structured(request).await
    }
}
