use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as HyperBuilder,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cli::ServeArgs;
use crate::clock::SystemClock;
use crate::error::{ServiceError, ServiceResult};
use crate::handler::{ServerState, handle};

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(args: ServeArgs) -> ServiceResult<()> {
    let addr = args.validate().map_err(ServiceError::Config)?;
    let summaries = args.remote.summary_service();
    if !summaries.has_credential() {
        tracing::info!("OPENAI_API_KEY not set, summaries will use the local fallback");
    }
    let state = Arc::new(ServerState::new(summaries, Arc::new(SystemClock)));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::FromString(format!("HTTP listen error on {addr}: {e}")))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
            signal.cancel();
        }
    });

    serve(listener, state, shutdown).await
}

/// Accept connections until `shutdown` is cancelled. Each connection runs on
/// its own task.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> ServiceResult<()> {
    loop {
        let (stream, peer): (_, SocketAddr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("HTTP accept error: {e}");
                    continue;
                }
            },
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle(req, Arc::clone(&state)));
            if let Err(err) = HyperBuilder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::warn!(%peer, "HTTP connection error: {err}");
            }
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{OpenAiClient, OpenAiConfig, SummaryService};

    #[tokio::test(flavor = "multi_thread")]
    async fn serves_requests_until_cancelled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let summaries = SummaryService::new(
            None,
            Arc::new(OpenAiClient::new(OpenAiConfig::default())),
        );
        let state = Arc::new(ServerState::new(summaries, Arc::new(SystemClock)));
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(listener, state, shutdown.clone()));

        let body = tokio::task::spawn_blocking(move || {
            ureq::post(&format!("http://{addr}/api/summarize"))
                .send_string(r#"{"tickets": []}"#)
                .unwrap()
                .into_json::<serde_json::Value>()
                .unwrap()
        })
        .await
        .unwrap();
        assert_eq!(body["provider"], "fallback");

        let status = tokio::task::spawn_blocking(move || {
            match ureq::post(&format!("http://{addr}/api/summarize")).send_string("not json") {
                Err(ureq::Error::Status(code, _)) => code,
                other => panic!("expected a client error, got {other:?}"),
            }
        })
        .await
        .unwrap();
        assert_eq!(status, 400);

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}
