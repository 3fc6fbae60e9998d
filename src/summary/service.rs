use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::summary::client::{RemoteError, RemoteSummarizer};
use crate::summary::fallback::fallback_summary;
use crate::types::Ticket;

/// Which summarizer produced the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "fallback")]
    Fallback,
}

/// Why a configured remote summarizer was not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FallbackNote {
    /// The API answered with a non-success status.
    #[serde(rename = "ai_fail")]
    AiFail,
    /// The request could not be completed or its reply decoded.
    #[serde(rename = "err")]
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResponse {
    pub summary: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<FallbackNote>,
}

impl SummaryResponse {
    fn remote(summary: String) -> Self {
        Self {
            summary,
            provider: Provider::OpenAi,
            note: None,
        }
    }

    fn fallback(summary: String, note: Option<FallbackNote>) -> Self {
        Self {
            summary,
            provider: Provider::Fallback,
            note,
        }
    }
}

/// Body of a summarize request.
///
/// Elements are kept as sent; the summarizers read them loosely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryRequest {
    #[serde(default)]
    pub tickets: Vec<Value>,
}

impl SummaryRequest {
    /// A missing or non-array `tickets` field reads as an empty board.
    pub fn from_value(value: &Value) -> Self {
        let tickets = value
            .get("tickets")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { tickets }
    }

    pub fn from_tickets(tickets: &[Ticket]) -> serde_json::Result<Self> {
        let tickets = tickets
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<_>>()?;
        Ok(Self { tickets })
    }
}

/// Remote-first board summaries with a local fallback.
///
/// Without an API key the remote summarizer is never called. With one, the
/// single remote attempt is not retried: any failure resolves to the
/// fallback text, tagged with a [`FallbackNote`].
#[derive(Clone)]
pub struct SummaryService {
    api_key: Option<String>,
    remote: Arc<dyn RemoteSummarizer>,
    busy: Arc<AtomicBool>,
}

impl SummaryService {
    pub fn new(api_key: Option<String>, remote: Arc<dyn RemoteSummarizer>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            remote,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn summarize(&self, tickets: Vec<Value>, now: DateTime<Utc>) -> SummaryResponse {
        let Some(api_key) = self.api_key.clone() else {
            tracing::debug!("No API key configured, using fallback summary");
            return SummaryResponse::fallback(fallback_summary(&tickets, now), None);
        };

        let tickets: Arc<[Value]> = tickets.into();
        let remote = Arc::clone(&self.remote);
        let board = Arc::clone(&tickets);
        let outcome =
            tokio::task::spawn_blocking(move || remote.summarize(&api_key, &board)).await;

        match outcome {
            Ok(Ok(Some(text))) => {
                tracing::info!("Board summarized by remote model");
                SummaryResponse::remote(text)
            }
            // the provider label stays "openai" even though the text is local
            Ok(Ok(None)) => {
                tracing::warn!("Remote summary had no content, substituting fallback text");
                SummaryResponse::remote(fallback_summary(&tickets, now))
            }
            Ok(Err(RemoteError::Status(code))) => {
                tracing::warn!("Remote summarizer answered HTTP {code}, using fallback");
                SummaryResponse::fallback(
                    fallback_summary(&tickets, now),
                    Some(FallbackNote::AiFail),
                )
            }
            Ok(Err(e)) => {
                tracing::warn!("Remote summarizer failed, using fallback: {e}");
                SummaryResponse::fallback(fallback_summary(&tickets, now), Some(FallbackNote::Error))
            }
            Err(e) => {
                tracing::warn!("Remote summarizer task failed, using fallback: {e}");
                SummaryResponse::fallback(fallback_summary(&tickets, now), Some(FallbackNote::Error))
            }
        }
    }

    /// Claim the single in-flight slot. `None` while another summary is
    /// running; the slot frees when the returned guard drops.
    ///
    /// `summarize` does not take the slot itself. It is for callers that
    /// embed the service and want to refuse overlapping requests, such as
    /// a UI that disables its summary button while one is pending.
    pub fn try_begin(&self) -> Option<InFlight> {
        if self.busy.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(InFlight {
                busy: Arc::clone(&self.busy),
            })
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[must_use = "the in-flight slot is released when this guard drops"]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, TicketDraft};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    type Reply = fn() -> Result<Option<String>, RemoteError>;

    struct Scripted {
        calls: AtomicUsize,
        reply: Reply,
    }

    impl Scripted {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteSummarizer for Scripted {
        fn summarize(&self, _: &str, _: &[Value]) -> Result<Option<String>, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn board() -> Vec<Ticket> {
        let mut draft = TicketDraft::new("Outage");
        draft.priority = Priority::Urgent;
        vec![Ticket::from_draft(
            "1".into(),
            draft,
            "2026-10-01T00:00:00.000Z".into(),
        )]
    }

    fn tickets() -> Vec<Value> {
        SummaryRequest::from_tickets(&board()).unwrap().tickets
    }

    fn expected_fallback() -> String {
        fallback_summary(&tickets(), now())
    }

    #[tokio::test]
    async fn without_credential_never_calls_remote() {
        let remote = Scripted::new(|| Ok(Some("remote".into())));
        for key in [None, Some(String::new()), Some("  ".to_string())] {
            let service = SummaryService::new(key, remote.clone());
            let res = service.summarize(tickets(), now()).await;
            assert_eq!(res.provider, Provider::Fallback);
            assert_eq!(res.note, None);
            assert_eq!(res.summary, expected_fallback());
        }
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn remote_text_is_returned_verbatim() {
        let remote = Scripted::new(|| Ok(Some("One urgent ticket.".into())));
        let service = SummaryService::new(Some("sk".into()), remote.clone());
        let res = service.summarize(tickets(), now()).await;
        assert_eq!(res, SummaryResponse::remote("One urgent ticket.".into()));
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn empty_content_keeps_openai_label() {
        let service = SummaryService::new(Some("sk".into()), Scripted::new(|| Ok(None)));
        let res = service.summarize(tickets(), now()).await;
        assert_eq!(res.provider, Provider::OpenAi);
        assert_eq!(res.note, None);
        assert_eq!(res.summary, expected_fallback());
    }

    #[tokio::test]
    async fn failures_map_to_notes() {
        let service = SummaryService::new(
            Some("sk".into()),
            Scripted::new(|| Err(RemoteError::Status(500))),
        );
        let res = service.summarize(tickets(), now()).await;
        assert_eq!(
            res,
            SummaryResponse::fallback(expected_fallback(), Some(FallbackNote::AiFail))
        );

        for reply in [
            (|| Err(RemoteError::Transport("refused".into()))) as Reply,
            (|| Err(RemoteError::Decode("eof".into()))) as Reply,
        ] {
            let service = SummaryService::new(Some("sk".into()), Scripted::new(reply));
            let res = service.summarize(tickets(), now()).await;
            assert_eq!(res.provider, Provider::Fallback);
            assert_eq!(res.note, Some(FallbackNote::Error));
        }
    }

    #[test]
    fn response_wire_shape() {
        let res = SummaryResponse::fallback("x".into(), Some(FallbackNote::AiFail));
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({ "summary": "x", "provider": "fallback", "note": "ai_fail" })
        );
        let res = SummaryResponse::remote("y".into());
        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            json!({ "summary": "y", "provider": "openai" })
        );
    }

    #[test]
    fn request_keeps_any_array_elements() {
        assert!(SummaryRequest::from_value(&json!({})).tickets.is_empty());
        assert!(
            SummaryRequest::from_value(&json!({ "tickets": "lots" }))
                .tickets
                .is_empty()
        );
        let loose = json!({ "tickets": [{ "id": 1 }, { "priority": "urgent" }] });
        assert_eq!(SummaryRequest::from_value(&loose).tickets.len(), 2);

        let req = SummaryRequest::from_tickets(&board()).unwrap();
        assert_eq!(req.tickets[0]["priority"], "urgent");
        assert_eq!(req.tickets[0]["createdAt"], "2026-10-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn loose_elements_are_summarized() {
        let service = SummaryService::new(None, Scripted::new(|| Ok(None)));
        let req = SummaryRequest::from_value(&json!({
            "tickets": [{ "priority": "urgent", "status": "review" }]
        }));
        let res = service.summarize(req.tickets, now()).await;
        assert!(res.summary.starts_with("Total 1. Priorities: urgent=1,"));
        assert!(res.summary.contains("review=1"));
    }

    #[test]
    fn in_flight_guard_blocks_second_request() {
        let service = SummaryService::new(None, Scripted::new(|| Ok(None)));
        let guard = service.try_begin().expect("first claim");
        assert!(service.is_busy());
        assert!(service.try_begin().is_none());
        drop(guard);
        assert!(!service.is_busy());
        assert!(service.try_begin().is_some());
    }
}
