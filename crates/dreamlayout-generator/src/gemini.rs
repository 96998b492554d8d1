//! Google Generative AI (`generateContent`) completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{GeneratorError, Result};
use crate::model::CompletionModel;

/// Google Generative AI API base URL.
pub const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model name, e.g. "gemini-2.5-flash".
    pub model: String,
    /// Sampling temperature (0.0-2.0).
    pub temperature: f32,
    pub base_url: String,
    /// Whole-request timeout, connect included. Unset by default: a
    /// generation runs until the API answers or the connection drops.
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: GOOGLE_API_BASE.to_string(),
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Google error wrapper.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    code: Option<u16>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Single-shot Gemini client. One request per [`complete`](CompletionModel::complete)
/// call, no retries.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client. A blank API key is a configuration error, reported
    /// here rather than on the first request.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeneratorError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(GeneratorError::Configuration(
                "model name is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(config.api_key.trim()).map_err(|_| {
            GeneratorError::Configuration("API key contains invalid characters".to_string())
        })?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GeneratorError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = request_body(prompt, self.config.temperature);

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "requesting completion");
        let response = self.client.post(self.endpoint()).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            GeneratorError::EmptyCompletion(format!("unreadable API response: {e}"))
        })?;
        extract_text(parsed)
    }
}

fn request_body(prompt: &str, temperature: f32) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "temperature": temperature
        }
    })
}

fn api_error(status: u16, body: &str) -> GeneratorError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => GeneratorError::Api {
            status: parsed.error.code.unwrap_or(status),
            message: parsed.error.message,
        },
        Err(_) => GeneratorError::Api {
            status,
            message: body.to_string(),
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeneratorError::EmptyCompletion(format!(
            "prompt blocked: {reason}"
        )));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GeneratorError::EmptyCompletion(
            "no candidates in response".to_string(),
        ));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(GeneratorError::EmptyCompletion(format!(
            "finish reason {reason}"
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let err = GeminiClient::new(GeminiConfig::new("  ")).unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_no_request_timeout_unless_asked() {
        assert_eq!(GeminiConfig::new("key").timeout, None);
        let config = GeminiConfig::new("key").with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(GeminiClient::new(config).is_ok());
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new(GeminiConfig::new("key").with_model("gemini-test")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("design a cafe", 0.7);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "design a cafe");
        assert_eq!(body["contents"][0]["role"], "user");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}], "role": "model"},
                                "finishReason": "STOP"}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let err = extract_text(parse(r#"{"candidates": []}"#)).unwrap_err();
        assert!(matches!(err, GeneratorError::EmptyCompletion(_)));
    }

    #[test]
    fn test_blocked_prompt() {
        let err = extract_text(parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Model returned no content: prompt blocked: SAFETY");
    }

    #[test]
    fn test_empty_text_reports_finish_reason() {
        let err = extract_text(parse(
            r#"{"candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_api_error_prefers_google_message() {
        let err = api_error(400, r#"{"error": {"code": 403, "message": "API key not valid"}}"#);
        match err {
            GeneratorError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(api_error(500, "oops"), GeneratorError::Api { status: 500, .. }));
    }
}
