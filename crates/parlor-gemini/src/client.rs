// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini generateContent API.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication, the request timeout, and classification of failures into
//! the [`CompletionError`] taxonomy. Retry is not this client's job: the
//! worker pool requeues transient failures through the queue with backoff.

use std::time::Duration;

use parlor_core::{CompletionError, ParlorError};
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Base URL for the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Reply used when the API returns 200 with no candidate text.
const EMPTY_REPLY_FALLBACK: &str = "No response from Gemini.";

/// HTTP client for Gemini API communication.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    request_timeout: Duration,
}

impl GeminiClient {
    /// Creates a new Gemini API client.
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key, sent as the `key` query parameter
    /// * `model` - Model identifier (e.g., "gemini-1.5-pro")
    /// * `base_url` - API base URL; overridden in tests
    /// * `request_timeout` - Per-request bound enforced by the HTTP client
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        request_timeout: Duration,
    ) -> Result<Self, ParlorError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ParlorError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
            request_timeout,
        })
    }

    /// Returns the model identifier this client targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates a reply for the prompt.
    ///
    /// A 200 with no candidate text yields a fixed fallback reply rather
    /// than an error; everything else maps onto the classified taxonomy.
    pub async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!(
            "{}/v1/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generateContent response received");

        if status.is_success() {
            let body: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::Unknown(format!("unreadable API response: {e}")))?;
            return Ok(body
                .text()
                .unwrap_or(EMPTY_REPLY_FALLBACK)
                .to_string());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }

    fn classify_transport(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.request_timeout)
        } else {
            CompletionError::Unknown(format!("transport error: {err}"))
        }
    }
}

/// Map a non-2xx response onto the classified error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> CompletionError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("API returned {status}"));

    match status.as_u16() {
        429 => CompletionError::RateLimited,
        403 => CompletionError::Forbidden(detail),
        404 => CompletionError::NotFound(detail),
        _ => CompletionError::Unknown(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            "test-api-key".into(),
            "gemini-1.5-pro".into(),
            base_url.to_string(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": text}]}}
            ]
        })
    }

    fn error_body(code: u16, status: &str) -> serde_json::Value {
        serde_json::json!({
            "error": {"code": code, "message": format!("upstream said {status}"), "status": status}
        })
    }

    #[tokio::test]
    async fn generate_returns_first_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hi there!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let reply = client.generate("Hello").await.unwrap();
        assert_eq!(reply, "Hi there!");
    }

    #[tokio::test]
    async fn empty_candidates_yield_fallback_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let reply = client.generate("Hello").await.unwrap();
        assert_eq!(reply, "No response from Gemini.");
    }

    #[tokio::test]
    async fn status_429_classifies_as_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(error_body(429, "RESOURCE_EXHAUSTED")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("Hello").await.unwrap_err();
        assert_eq!(err, CompletionError::RateLimited);
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn status_403_classifies_as_forbidden() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(error_body(403, "PERMISSION_DENIED")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Forbidden(ref msg) if msg.contains("PERMISSION_DENIED")
        ));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn status_404_classifies_as_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(error_body(404, "NOT_FOUND")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::NotFound(_)));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn status_500_classifies_as_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(500).set_body_json(error_body(500, "INTERNAL")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Unknown(_)));
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn unparseable_error_body_still_classifies_by_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate("Hello").await.unwrap_err();
        assert_eq!(err, CompletionError::RateLimited);
    }

    #[tokio::test]
    async fn slow_upstream_classifies_as_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply_body("too late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(
            "test-api-key".into(),
            "gemini-1.5-pro".into(),
            server.uri(),
            Duration::from_millis(50),
        )
        .unwrap();

        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout(_)));
        assert!(!err.is_terminal());
    }
}
