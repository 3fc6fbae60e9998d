//! Remote summarizer collaborator
//!
//! Talks to an OpenAI-compatible chat completions endpoint over blocking
//! `ureq`. Callers on an async runtime should go through
//! [`crate::summary::SummaryService`], which moves the call onto the
//! blocking pool.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Serialized board is cut to this many characters before it is sent.
pub const MAX_BOARD_CHARS: usize = 15_000;

const SYSTEM_PROMPT: &str = "You summarize task boards briefly.";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("summarizer API returned HTTP {0}")]
    Status(u16),
    #[error("summarizer request failed: {0}")]
    Transport(String),
    #[error("failed to decode summarizer response: {0}")]
    Decode(String),
}

/// A language-model backend that can summarize a board.
pub trait RemoteSummarizer: Send + Sync {
    /// `Ok(None)` means the call succeeded but the reply had no usable text.
    fn summarize(&self, api_key: &str, tickets: &[Value]) -> Result<Option<String>, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

pub struct OpenAiClient {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            agent: ureq::AgentBuilder::new().timeout(config.timeout).build(),
        }
    }
}

impl RemoteSummarizer for OpenAiClient {
    fn summarize(&self, api_key: &str, tickets: &[Value]) -> Result<Option<String>, RemoteError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: board_prompt(tickets),
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => RemoteError::Status(code),
                ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
            })?;

        let value: Value = response
            .into_json()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(completion_text(&value))
    }
}

/// User message sent with the (truncated) board.
pub fn board_prompt(tickets: &[Value]) -> String {
    let board = serde_json::to_string(tickets).unwrap_or_default();
    let board: String = board.chars().take(MAX_BOARD_CHARS).collect();
    format!(
        "Summarize this ticket board in 3 short sentences, include counts by status and priority, and mention urgent/overdue: {board}"
    )
}

/// `choices[0].message.content`, if it is a non-empty string.
pub fn completion_text(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ticket, TicketDraft};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tickets() -> Vec<Value> {
        let ticket = Ticket::from_draft(
            "1".into(),
            TicketDraft::new("Fix login"),
            "2026-10-01T00:00:00.000Z".into(),
        );
        vec![serde_json::to_value(ticket).unwrap()]
    }

    fn client(base_url: String) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..OpenAiConfig::default()
        })
    }

    async fn call(client: OpenAiClient) -> Result<Option<String>, RemoteError> {
        tokio::task::spawn_blocking(move || client.summarize("sk-test", &tickets()))
            .await
            .unwrap()
    }

    #[test]
    fn prompt_is_truncated() {
        let mut draft = TicketDraft::new("x".repeat(MAX_BOARD_CHARS * 2));
        draft.description = "tail marker".into();
        let big = Ticket::from_draft("1".into(), draft, String::new());
        let big = vec![serde_json::to_value(big).unwrap()];
        let prompt = board_prompt(&big);
        assert!(prompt.starts_with("Summarize this ticket board in 3 short sentences"));
        assert!(!prompt.contains("tail marker"));
        assert!(prompt.chars().count() < MAX_BOARD_CHARS + 200);
    }

    #[test]
    fn completion_text_requires_non_empty_content() {
        let ok = json!({ "choices": [{ "message": { "content": "All good." } }] });
        assert_eq!(completion_text(&ok).as_deref(), Some("All good."));
        assert!(completion_text(&json!({ "choices": [] })).is_none());
        let empty = json!({ "choices": [{ "message": { "content": "" } }] });
        assert!(completion_text(&empty).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn returns_completion_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Three tickets." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = call(client(server.uri())).await.unwrap();
        assert_eq!(text.as_deref(), Some("Three tickets."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = call(client(server.uri())).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status(429)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_content_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        assert!(call(client(server.uri())).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = call(client(server.uri())).await.unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_host_is_a_transport_error() {
        let err = call(client("http://127.0.0.1:1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }
}
