//! Mock backend for testing without a live LLM.
//!
//! [`MockBackend`] returns pre-configured responses in order and records
//! every request it sees, so tests can assert on prompts and call order.
//!
//! # Example
//!
//! ```
//! use article_topics::backend::MockBackend;
//!
//! let mock = MockBackend::new(vec!["1. First topic".to_string()]);
//! assert_eq!(mock.calls(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;

/// A test backend that returns canned responses in order.
///
/// Cycles back to the beginning when all responses have been consumed.
#[derive(Debug)]
pub struct MockBackend {
    responses: Vec<String>,
    index: AtomicUsize,
    fail_at: Option<usize>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockBackend {
    /// Create a mock backend with the given canned responses.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "MockBackend requires at least one response");
        Self {
            responses,
            index: AtomicUsize::new(0),
            fail_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Make the call with 0-based index `call` fail with HTTP 500.
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    /// Number of calls made so far, including a failed one.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let call = self.index.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(call) {
            return Err(PipelineError::HttpError {
                status: 500,
                body: format!("mock failure on call {}", call),
            });
        }
        let text = self.responses[call % self.responses.len()].clone();
        Ok(LlmResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest {
            model: "test".to_string(),
            system_prompt: None,
            prompt: prompt.to_string(),
            config: LlmConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let client = Client::new();
        let resp = mock.complete(&client, "http://unused", &request("p")).await.unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_mock_cycles_responses() {
        let mock = MockBackend::new(vec!["first".into(), "second".into()]);
        let client = Client::new();
        let r1 = mock.complete(&client, "http://unused", &request("a")).await.unwrap();
        let r2 = mock.complete(&client, "http://unused", &request("b")).await.unwrap();
        let r3 = mock.complete(&client, "http://unused", &request("c")).await.unwrap();
        assert_eq!(r1.text, "first");
        assert_eq!(r2.text, "second");
        assert_eq!(r3.text, "first"); // cycles
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockBackend::fixed("ok");
        let client = Client::new();
        mock.complete(&client, "http://unused", &request("one")).await.unwrap();
        mock.complete(&client, "http://unused", &request("two")).await.unwrap();
        let prompts: Vec<_> = mock.requests().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_mock_failing_at() {
        let mock = MockBackend::fixed("ok").failing_at(1);
        let client = Client::new();
        assert!(mock.complete(&client, "http://unused", &request("a")).await.is_ok());
        let err = mock.complete(&client, "http://unused", &request("b")).await.unwrap_err();
        assert!(matches!(err, PipelineError::HttpError { status: 500, .. }));
        assert!(mock.complete(&client, "http://unused", &request("c")).await.is_ok());
    }
}
