use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};

use crate::clock::Clock;
use crate::summary::{SummaryRequest, SummaryService};

pub type HttpResponse = Response<Full<Bytes>>;

/// Largest request body accepted by `POST /api/summarize`.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Shared by every connection the server accepts.
pub struct ServerState {
    pub version: &'static str,
    pub summaries: SummaryService,
    pub clock: Arc<dyn Clock>,
    started_at: Instant,
}

impl ServerState {
    pub fn new(summaries: SummaryService, clock: Arc<dyn Clock>) -> Self {
        Self {
            version: crate::metadata::PKG_VERSION,
            summaries,
            clock,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Route one request. Never fails; errors become JSON error responses.
pub async fn handle<B>(req: Request<B>, state: Arc<ServerState>) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, "/api/summarize") => summarize(req, &state).await,
        (&Method::GET, "/health") => health(&state),
        (_, "/api/summarize" | "/health") => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
        }
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    };
    Ok(response)
}

async fn summarize<B>(req: Request<B>, state: &ServerState) -> HttpResponse
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES);
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("Failed to read request body: {e}");
            return error_response(StatusCode::BAD_REQUEST, "bad json");
        }
    };
    let Ok(value) = serde_json::from_slice::<Value>(&bytes) else {
        return error_response(StatusCode::BAD_REQUEST, "bad json");
    };
    let request = SummaryRequest::from_value(&value);

    let result = state
        .summaries
        .summarize(request.tickets, state.clock.now())
        .await;
    tracing::info!(provider = ?result.provider, note = ?result.note, "Summary served");
    json_response(StatusCode::OK, &result)
}

fn health(state: &ServerState) -> HttpResponse {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "ok",
            "version": state.version,
            "uptimeSeconds": state.uptime().as_secs(),
        }),
    )
}

fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
