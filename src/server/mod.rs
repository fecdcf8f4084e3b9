//! HTTP front-end for the trend assistant.
//!
//! `GET /health` reports liveness and `POST /api/ask` answers a question from
//! the trend index. Requests are traced and CORS is open so a browser chat
//! page on another origin can call the API.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Errors raised while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listening socket could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Router with tracing and permissive CORS applied.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Listen on all interfaces at `port` until `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    serve_on(listener, state, shutdown_signal).await
}

/// Serve the API on an already bound listener.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn serve_on<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown_signal: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("trendrag API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    tracing::info!("trendrag API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::{FakeEmbedder, FakeGenerator};
    use crate::rag::{RagConfig, StorageConfig, TrendAssistant};

    #[tokio::test]
    async fn test_health_and_ask_over_http() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.storage = StorageConfig {
            index_dir: tmp.path().join("trend_index"),
            staging_path: tmp.path().join("output.csv"),
            ..StorageConfig::default()
        };
        let state = AppState::new(
            TrendAssistant::new(
                &config,
                Arc::new(FakeEmbedder::default()),
                Arc::new(FakeGenerator::default()),
            )
            .unwrap(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_on(listener, state, async {
            let _ = stopped.await;
        }));

        let client = reqwest::Client::new();
        let health: serde_json::Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["service"], "trendrag");

        let ask = client
            .post(format!("{base}/api/ask"))
            .json(&serde_json::json!({"question": "What is trending?"}))
            .send()
            .await
            .unwrap();
        assert_eq!(ask.status().as_u16(), 503);

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
