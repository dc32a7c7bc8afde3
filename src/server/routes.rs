//! Axum route handlers for the assistant HTTP server.
//!
//! # Routes
//!
//! - `GET  /health` : returns `{"status": "ok", "version": "..."}`
//! - `POST /ask`    : accepts `AskRequest`, returns a `ChatReply`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chat::{ChatHandler, ChatReply, ChatTurn, ConversationHistory, DEFAULT_HISTORY_TURNS};

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Question answering pipeline, shared by all requests.
    pub handler: Arc<ChatHandler>,
    /// Turns of client-supplied history kept per request.
    pub history_turns: usize,
}

impl AppState {
    pub fn new(handler: ChatHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    pub fn with_history_turns(mut self, history_turns: usize) -> Self {
        self.history_turns = history_turns;
        self
    }
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "nhl-assistant",
    }))
}

/// POST /ask
///
/// The loop makes blocking oracle calls, so it runs on `spawn_blocking`.
/// Loop failures are already folded into the reply text; only a panicked
/// worker produces a 500.
async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<Value>)> {
    let history = ConversationHistory::from_turns(request.history, state.history_turns);
    let handler = Arc::clone(&state.handler);
    let question = request.question;

    tracing::debug!(question = %question, turns = history.turns().len(), "ask");

    let result = tokio::task::spawn_blocking(move || handler.answer(&question, &history)).await;

    match result {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            tracing::error!("Question worker failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Question worker failed: {}", e)})),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentExecutor, ExecutionMode, Summarizer};
    use crate::llms::scripted::ScriptedLLM;
    use crate::stats::tests::fixture_store;
    use crate::stats::StatsService;
    use crate::tools::ToolDispatcher;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::ServiceExt;

    fn state(llm: Arc<ScriptedLLM>) -> AppState {
        let dispatcher = ToolDispatcher::new(StatsService::new(Arc::new(fixture_store())))
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        let executor =
            AgentExecutor::new(llm.clone(), dispatcher).with_mode(ExecutionMode::SingleShot);
        AppState::new(ChatHandler::new(executor, Summarizer::new(llm)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn ask(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app_router(state(Arc::new(ScriptedLLM::new(Vec::<String>::new()))));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "nhl-assistant");
    }

    #[tokio::test]
    async fn test_ask_returns_data_reply() {
        let llm = Arc::new(ScriptedLLM::new([
            r#"{"tool": "get_team_overview", "team_name": "florida panthers", "season": "20232024"}"#,
            "Florida has 110 points.",
        ]));
        let app = app_router(state(llm));

        let response = app
            .oneshot(ask(serde_json::json!({"question": "How are the Panthers doing?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["result_type"], "data");
        let payload = json["payload"].as_str().unwrap();
        assert!(payload.contains("Florida Panthers"));
        assert!(payload.ends_with("Florida has 110 points."));
    }

    #[tokio::test]
    async fn test_ask_passes_history_to_oracle() {
        let llm = Arc::new(ScriptedLLM::new([
            r#"{"tool": "none", "explanation": "Only hockey, sorry."}"#,
        ]));
        let app = app_router(state(llm.clone()));

        let response = app
            .oneshot(ask(serde_json::json!({
                "question": "And basketball?",
                "history": [
                    {"role": "user", "content": "Who won the Cup in 2023?"},
                    {"role": "assistant", "content": "Vegas."}
                ]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["result_type"], "text");
        assert_eq!(json["payload"], "Only hockey, sorry.");
        assert!(llm.prompts()[0].contains("Assistant: Vegas."));
    }

    #[tokio::test]
    async fn test_ask_rejects_malformed_body() {
        let app = app_router(state(Arc::new(ScriptedLLM::new(Vec::<String>::new()))));
        let response = app
            .oneshot(ask(serde_json::json!({"history": []})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
