pub mod advisory; // Language-model opinion client + fallback
pub mod api; // HTTP router, handlers, server
pub mod config;
pub mod core_state; // Shared application state
pub mod db;
pub mod engine; // Triage session state machine
pub mod locks;
pub mod models;
pub mod observation; // Image observation extraction
pub mod risk; // Keyword scoring + risk fusion
pub mod safety; // Emergency interception
pub mod triage; // Classification, questions, routing, summaries
pub mod wellbeing; // Companion chat + daily check-in

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Process entry point: logging, settings, state, then serve until Ctrl-C.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Triage engine starting v{}", config::APP_VERSION);

    let settings = config::Settings::from_env();
    let core = core_state::CoreState::from_settings(settings).map_err(|e| e.to_string())?;

    api::serve_until_ctrl_c(Arc::new(core))
        .await
        .map_err(|e| e.to_string())
}
