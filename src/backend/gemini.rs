//! Backend for the Google Generative Language API (Gemini models).
//!
//! Endpoint: `/v1beta/models/{model}:generateContent`.
//! Authentication: `x-goog-api-key` header.

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default base URL of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Backend for Gemini models.
///
/// # Example
///
/// ```
/// use article_topics::backend::GeminiBackend;
///
/// let backend = GeminiBackend::new("AIza...");
/// ```
#[derive(Clone)]
pub struct GeminiBackend {
    api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = match self.api_key.get(..6) {
            Some(head) if self.api_key.len() > 6 => format!("{}***", head),
            _ => "***".to_string(),
        };
        f.debug_struct("GeminiBackend")
            .field("api_key", &masked)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the request body for `generateContent`.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}],
            }],
            "generationConfig": {
                "temperature": request.config.temperature,
                "maxOutputTokens": request.config.max_tokens,
            },
        });

        if let Some(ref sys) = request.system_prompt {
            if !sys.is_empty() {
                body["systemInstruction"] = json!({"parts": [{"text": sys}]});
            }
        }

        body
    }

    /// Build the reqwest request with the API key header.
    fn build_http_request(
        &self,
        client: &Client,
        url: &str,
        body: &Value,
    ) -> reqwest::RequestBuilder {
        client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
    }

    fn endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(json_resp: &Value) -> Result<String> {
        let candidate = json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or_else(|| {
                let reason = json_resp
                    .pointer("/promptFeedback/blockReason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("no candidates returned");
                PipelineError::Other(format!("Gemini returned no content: {}", reason))
            })?;

        let text = candidate
            .pointer("/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        if let Some(v) = json_resp.get("usageMetadata") {
            meta.insert("usage".into(), v.clone());
        }
        if let Some(v) = json_resp.get("modelVersion") {
            meta.insert("model".into(), v.clone());
        }
        if let Some(v) = json_resp.pointer("/candidates/0/finishReason") {
            meta.insert("finish_reason".into(), v.clone());
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = Self::endpoint(base_url, &request.model);
        let body = Self::build_body(request);

        let resp = self
            .build_http_request(client, &url, &body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!("Failed to connect to LLM at {}: {}", url, e))
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        let json_resp: Value = resp.json().await?;
        Ok(LlmResponse {
            text: Self::extract_text(&json_resp)?,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "gemini-2.0-flash".into(),
            system_prompt: None,
            prompt: "List topics".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_body_without_system() {
        let body = GeminiBackend::build_body(&test_request());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "List topics");
        assert_eq!(body["generationConfig"]["temperature"], 0.8);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_body_with_system() {
        let mut request = test_request();
        request.system_prompt = Some("You are a Topic Planner.".into());
        let body = GeminiBackend::build_body(&request);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a Topic Planner."
        );
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            GeminiBackend::endpoint("https://generativelanguage.googleapis.com/", "gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{
                "content": {"parts": [{"text": "1. One\n"}, {"text": "2. Two"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 12}
        });
        assert_eq!(GeminiBackend::extract_text(&resp).unwrap(), "1. One\n2. Two");
        let meta = GeminiBackend::extract_metadata(&resp).unwrap();
        assert_eq!(meta["finish_reason"], "STOP");
        assert_eq!(meta["usage"]["totalTokenCount"], 12);
    }

    #[test]
    fn test_extract_text_blocked() {
        let resp = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = GeminiBackend::extract_text(&resp).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_debug_masks_key() {
        let debug = format!("{:?}", GeminiBackend::new("AIzaSyVerySecret"));
        assert!(debug.contains("AIzaSy***"));
        assert!(!debug.contains("VerySecret"));
    }

    #[test]
    fn test_api_key_header() {
        let backend = GeminiBackend::new("k123");
        let client = Client::new();
        let url = GeminiBackend::endpoint(DEFAULT_BASE_URL, "gemini-2.0-flash");
        let req = backend
            .build_http_request(&client, &url, &json!({"test": true}))
            .build()
            .expect("build request");
        assert_eq!(req.headers().get("x-goog-api-key").unwrap(), "k123");
        assert!(req.headers().get("Authorization").is_none());
    }
}
