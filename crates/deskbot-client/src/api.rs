//! Support backend REST API client
//!
//! Communicates with the deskbot backend server. Every failure, whether
//! transport, parse or server-reported, surfaces as a single
//! `RequestFailed` with a human-readable message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use deskbot_core::gateway::{ChatReply, Gateway, HealthReport, RequestFailed, ResetAck};
use deskbot_core::BackendConfig;

/// Fallback failure phrase for a non-2xx response with no usable body
const REQUEST_FAILED: &str = "request failed";

/// Backend REST API client
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    chat_timeout: Duration,
    reset_timeout: Duration,
    health_timeout: Duration,
}

impl BackendClient {
    /// Create a new backend client from config
    pub fn new(config: &BackendConfig) -> Result<Self, RequestFailed> {
        let client = Client::builder()
            .build()
            .map_err(|e| RequestFailed::new(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_timeout: Duration::from_secs(config.chat_timeout_secs),
            reset_timeout: Duration::from_secs(config.reset_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// Send a request and apply the shared response rule: non-2xx becomes
    /// a `RequestFailed` with the extracted message, 2xx returns the body
    /// plus whether the content type was JSON.
    async fn execute(&self, request: RequestBuilder) -> Result<(bool, String), RequestFailed> {
        let response = request
            .send()
            .await
            .map_err(|e| RequestFailed::new(e.to_string()))?;

        let status = response.status();
        let json_body = is_json(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            debug!("Backend returned {}: {}", status, body);
            return Err(RequestFailed::new(failure_message(json_body, &body)));
        }

        Ok((json_body, body))
    }
}

#[async_trait]
impl Gateway for BackendClient {
    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatReply, RequestFailed> {
        let url = format!("{}/chat", self.base_url);
        let body = serde_json::json!({
            "session_id": session_id,
            "message": message,
        });

        debug!("Sending chat message for session {}", session_id);

        let (json_body, text) = self
            .execute(self.client.post(&url).timeout(self.chat_timeout).json(&body))
            .await?;

        if json_body {
            serde_json::from_str(&text)
                .map_err(|e| RequestFailed::new(format!("Failed to parse response: {e}")))
        } else {
            // Plain-text 2xx body is the reply itself
            Ok(ChatReply {
                reply: text.trim().to_string(),
                source: String::new(),
            })
        }
    }

    async fn reset(&self, session_id: &str) -> Result<ResetAck, RequestFailed> {
        let url = format!("{}/reset", self.base_url);
        let body = serde_json::json!({ "session_id": session_id });

        debug!("Resetting backend history for session {}", session_id);

        let (json_body, text) = self
            .execute(self.client.post(&url).timeout(self.reset_timeout).json(&body))
            .await?;

        if json_body {
            serde_json::from_str(&text)
                .map_err(|e| RequestFailed::new(format!("Failed to parse response: {e}")))
        } else {
            Ok(ResetAck {
                message: text.trim().to_string(),
            })
        }
    }

    async fn health(&self) -> Result<HealthReport, RequestFailed> {
        let url = format!("{}/health", self.base_url);

        let (json_body, text) = self
            .execute(self.client.get(&url).timeout(self.health_timeout))
            .await?;

        if json_body {
            serde_json::from_str(&text)
                .map_err(|e| RequestFailed::new(format!("Failed to parse response: {e}")))
        } else {
            Ok(HealthReport {
                status: text.trim().to_string(),
                ..Default::default()
            })
        }
    }
}

/// Whether the response headers declare a JSON body
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("json"))
        .unwrap_or(false)
}

/// Failure message for a non-2xx response: the JSON `error` field when
/// present, else the raw body text, else a fixed fallback phrase.
fn failure_message(json_body: bool, body: &str) -> String {
    if json_body {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
                return error.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        REQUEST_FAILED.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(base_url: &str) -> BackendClient {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = client_for("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_chat_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(serde_json::json!({
                "session_id": "sid-1",
                "message": "Hi"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "Hello!",
                "source": "faq"
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server.uri()).chat("sid-1", "Hi").await.unwrap();
        assert_eq!(reply.reply, "Hello!");
        assert_eq!(reply.source, "faq");
    }

    #[tokio::test]
    async fn test_chat_plain_text_body_is_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain answer"))
            .mount(&server)
            .await;

        let reply = client_for(&server.uri()).chat("sid-1", "Hi").await.unwrap();
        assert_eq!(reply.reply, "plain answer");
        assert!(reply.source.is_empty());
    }

    #[tokio::test]
    async fn test_chat_surfaces_json_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Internal server error."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).chat("sid-1", "Hi").await.unwrap_err();
        assert_eq!(err.message, "Internal server error.");
    }

    #[tokio::test]
    async fn test_chat_surfaces_plain_text_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).chat("sid-1", "Hi").await.unwrap_err();
        assert_eq!(err.message, "upstream down");
    }

    #[tokio::test]
    async fn test_chat_empty_error_body_uses_fallback_phrase() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).chat("sid-1", "Hi").await.unwrap_err();
        assert_eq!(err.message, REQUEST_FAILED);
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_failed() {
        // No server listening on this port
        let err = client_for("http://127.0.0.1:9")
            .chat("sid-1", "Hi")
            .await
            .unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn test_reset_parses_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reset"))
            .and(body_json(serde_json::json!({ "session_id": "sid-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Session sid-1 history cleared successfully"
            })))
            .mount(&server)
            .await;

        let ack = client_for(&server.uri()).reset("sid-1").await.unwrap();
        assert_eq!(ack.message, "Session sid-1 history cleared successfully");
    }

    #[tokio::test]
    async fn test_health_parses_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "services": {
                    "faq_system": { "status": "available", "faq_count": 7 },
                    "gemini_ai": { "status": "available" }
                }
            })))
            .mount(&server)
            .await;

        let report = client_for(&server.uri()).health().await.unwrap();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.services.faq_system.faq_count, Some(7));
    }

    #[test]
    fn test_failure_message_prefers_json_error() {
        assert_eq!(
            failure_message(true, r#"{"error": "bad request"}"#),
            "bad request"
        );
        assert_eq!(failure_message(true, r#"{"status": "no"}"#), r#"{"status": "no"}"#);
        assert_eq!(failure_message(false, "raw body"), "raw body");
        assert_eq!(failure_message(false, "  "), REQUEST_FAILED);
    }
}
