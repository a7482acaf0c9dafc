//! Mock inference provider for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    InferenceProvider, StructuredRequest, StructuredResponse, TextRequest, TextResponse, Usage,
};
use crate::{Error, Result};

/// Replays scripted text replies and records every request.
///
/// Once the script runs out, the fallback reply (if any) is returned;
/// otherwise the call fails with a provider error.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: Option<String>,
    error: Option<String>,
    structured: Option<Value>,
    requests: Mutex<Vec<TextRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always reply with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    /// Reply with each entry in turn; `Err` entries fail the call
    pub fn scripted(replies: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Every call fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Reply used once the script runs out
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Value returned by structured requests
    pub fn with_structured(mut self, object: Value) -> Self {
        self.structured = Some(object);
        self
    }

    /// Text requests received so far
    pub fn requests(&self) -> Vec<TextRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> Result<String> {
        if let Some(message) = &self.error {
            return Err(Error::provider(message.clone()));
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|_| Error::provider("mock provider state poisoned"))?;

        match replies.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(Error::provider(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| Error::provider("mock provider script exhausted")),
        }
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<TextResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let text = self.next_reply()?;
        Ok(TextResponse {
            usage: Usage {
                prompt_tokens: request.prompt.split_whitespace().count() as u64,
                completion_tokens: text.split_whitespace().count() as u64,
            },
            text,
        })
    }

    async fn generate_structured(&self, _request: &StructuredRequest) -> Result<StructuredResponse> {
        self.structured
            .clone()
            .map(|object| StructuredResponse { object })
            .ok_or_else(|| Error::provider("no structured reply scripted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_then_fallback() {
        let provider = MockProvider::scripted(vec![Ok("first".into())]).with_fallback("fallback");
        let request = TextRequest::new("m", "improve");
        assert_eq!(provider.generate_text(&request).await.unwrap().text, "first");
        assert_eq!(provider.generate_text(&request).await.unwrap().text, "fallback");
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_keeps_failing() {
        let provider = MockProvider::failing("rate limited");
        let request = TextRequest::new("m", "improve");
        assert!(provider.generate_text(&request).await.unwrap_err().is_provider());
        assert!(provider.generate_text(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let provider = MockProvider::new();
        assert!(provider.generate_text(&TextRequest::new("m", "x")).await.is_err());
    }

    #[tokio::test]
    async fn test_structured() {
        let provider = MockProvider::new().with_structured(json!({"passed": true}));
        let response = provider
            .generate_structured(&StructuredRequest {
                model: "m".into(),
                prompt: "judge".into(),
                schema: json!({}),
            })
            .await
            .unwrap();
        assert_eq!(response.object["passed"], true);
    }
}
