//! Backend gateway port
//!
//! The conversation controller talks to the remote support backend through
//! the [`Gateway`] trait. The reqwest implementation lives in
//! deskbot-client; tests substitute mocks.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// The single error kind for unsuccessful backend calls.
///
/// Transport failures, malformed bodies and server-reported errors all
/// collapse into this; the message is exactly what the transcript shows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestFailed {
    pub message: String,
}

impl RequestFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reply payload from `POST /chat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text; may be empty
    #[serde(default)]
    pub reply: String,
    /// Knowledge source the backend answered from ("faq", "ai", ...)
    #[serde(default)]
    pub source: String,
}

/// Acknowledgement payload from `POST /reset`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResetAck {
    /// Confirmation text; may be empty
    #[serde(default)]
    pub message: String,
}

/// Status payload from `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    /// Overall status ("healthy" / "unhealthy")
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub services: ServiceHealth,
}

/// Per-service health summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceHealth {
    #[serde(default)]
    pub faq_system: FaqHealth,
    #[serde(default, rename = "gemini_ai")]
    pub ai: AiHealth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FaqHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub faq_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AiHealth {
    #[serde(default)]
    pub status: String,
}

impl HealthReport {
    /// One-line status summary for the UI header
    pub fn badge(&self) -> String {
        let status = if self.status.is_empty() {
            "unhealthy"
        } else {
            &self.status
        };
        let faqs = self
            .services
            .faq_system
            .faq_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let ai = if self.services.ai.status.is_empty() {
            "unavailable"
        } else {
            &self.services.ai.status
        };
        format!("Backend: {status} • FAQs: {faqs} • AI: {ai}")
    }
}

/// Remote support backend operations
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send a user message for the given session, returning the reply
    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatReply, RequestFailed>;

    /// Clear the server-side history for the given session
    async fn reset(&self, session_id: &str) -> Result<ResetAck, RequestFailed>;

    /// Fetch the backend status report
    async fn health(&self) -> Result<HealthReport, RequestFailed>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display() {
        let err = RequestFailed::new("timeout");
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_health_report_parsing() {
        let json = r#"{
            "status": "healthy",
            "timestamp": "2026-01-01T00:00:00",
            "services": {
                "faq_system": {"status": "available", "faq_count": 12},
                "gemini_ai": {"status": "available", "last_error": null}
            }
        }"#;

        let report: HealthReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.services.faq_system.faq_count, Some(12));
        assert_eq!(report.badge(), "Backend: healthy • FAQs: 12 • AI: available");
    }

    #[test]
    fn test_health_report_partial_payload() {
        let report: HealthReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report.badge(), "Backend: unhealthy • FAQs: - • AI: unavailable");
    }

    #[test]
    fn test_chat_reply_defaults() {
        let reply: ChatReply = serde_json::from_str(r#"{"reply": "Hello!"}"#).unwrap();
        assert_eq!(reply.reply, "Hello!");
        assert!(reply.source.is_empty());
    }
}
