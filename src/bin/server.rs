//! nhl-assistant HTTP server binary.
//!
//! Starts an axum HTTP server exposing the chat surface.
//!
//! # Environment Variables
//!
//! - `NHL_ASSISTANT__PORT` : HTTP port (default: 8080)
//! - `NHL_ASSISTANT__DATABASE_PATH` : SQLite statistics file
//! - `GOOGLE_API_KEY` : oracle API key
//! - `RUST_LOG` : tracing filter (default: "info,nhl_assistant=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;

use nhl_assistant::agents::{AgentExecutor, Summarizer};
use nhl_assistant::chat::ChatHandler;
use nhl_assistant::config::Settings;
use nhl_assistant::llms::{BaseLLM, GeminiCompletion};
use nhl_assistant::server::{app_router, AppState};
use nhl_assistant::stats::StatsService;
use nhl_assistant::store::SqliteStatsStore;
use nhl_assistant::tools::ToolDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nhl_assistant=debug".into()),
        )
        .init();

    let settings = Settings::load().context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    let store = SqliteStatsStore::open(&settings.database_path)
        .with_context(|| format!("Failed to open {}", settings.database_path))?;
    let llm: Arc<dyn BaseLLM> = Arc::new(
        GeminiCompletion::new(settings.model.clone(), settings.google_api_key.clone())
            .with_timeout(settings.request_timeout()),
    );

    let dispatcher = ToolDispatcher::new(StatsService::new(Arc::new(store)));
    let executor = AgentExecutor::new(Arc::clone(&llm), dispatcher).with_mode(settings.execution_mode());
    let handler = ChatHandler::new(executor, Summarizer::new(llm));
    let state = AppState::new(handler).with_history_turns(settings.history_turns);

    let app = app_router(state);
    let bind_addr = format!("0.0.0.0:{}", settings.port);

    tracing::info!("nhl-assistant server starting on {}", bind_addr);
    tracing::info!("Model: {}, database: {}", settings.model, settings.database_path);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health : liveness check");
    tracing::info!("  POST /ask    : answer a question");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
