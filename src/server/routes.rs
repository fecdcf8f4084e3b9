//! HTTP route handlers for the trend assistant API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::rag::RagError;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/ask", post(ask))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "trendrag",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// One prior exchange, as sent by chat front-ends.
#[derive(Debug, Deserialize)]
pub struct HistoryTurn {
    /// Speaker role.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Question request.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The user's question.
    pub question: String,
    /// Earlier turns. Accepted for client compatibility; answers are stateless.
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

/// Question response.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Formatted answer.
    pub answer: String,
}

/// Answer a question from the trend index.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    if !request.history.is_empty() {
        tracing::debug!("Ignoring {} history turns", request.history.len());
    }

    let answer = state
        .assistant
        .ask(&request.question)
        .await
        .map_err(|e| (status_for(&e), e.to_string()))?;

    Ok(Json(AskResponse { answer }))
}

fn status_for(error: &RagError) -> StatusCode {
    match error {
        RagError::IndexUnavailable | RagError::BuildInProgress(_) => {
            tracing::warn!("Ask rejected: {error}");
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => {
            tracing::error!("Ask failed: {error}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::rag::test_support::{FakeEmbedder, FakeGenerator, entry};
    use crate::rag::{RagConfig, StorageConfig, TrendAssistant};
    use crate::scraping::staging::write_staging;

    fn state(root: &Path, reply: &str) -> Arc<AppState> {
        let mut config = RagConfig::default();
        config.storage = StorageConfig {
            index_dir: root.join("trend_index"),
            staging_path: root.join("output.csv"),
            ..StorageConfig::default()
        };
        AppState::new(TrendAssistant::new(
            &config,
            Arc::new(FakeEmbedder::default()),
            Arc::new(FakeGenerator::replying(reply)),
        )
        .unwrap())
    }

    fn request(json: &str) -> Json<AskRequest> {
        Json(serde_json::from_str(json).unwrap())
    }

    #[tokio::test]
    async fn test_ask_returns_formatted_answer() {
        let tmp = tempfile::tempdir().unwrap();
        write_staging(
            &tmp.path().join("output.csv"),
            &[entry("node-1", "EntA", "1", "Topic X", "http://x")],
        )
        .unwrap();

        let Json(response) = ask(
            State(state(tmp.path(), "<think>hm</think>**Topic X**")),
            request(r#"{"question": "What is trending?", "history": [{"role": "user", "content": "hi"}]}"#),
        )
        .await
        .unwrap();

        assert!(response.answer.starts_with("<details><summary>"));
        assert!(response.answer.ends_with("</details>**Topic X**"));
    }

    #[tokio::test]
    async fn test_ask_without_index_is_503() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ask(
            State(state(tmp.path(), "unused")),
            request(r#"{"question": "What is trending?"}"#),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_service_errors_are_500() {
        let err = RagError::CorruptIndex {
            path: PathBuf::from("trend_index"),
            reason: "missing".to_string(),
        };
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
