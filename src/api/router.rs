//! HTTP router.
//!
//! Layers, innermost first: audit (access log + `Cache-Control: no-store`),
//! request tracing, CORS, body limit.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Multipart framing on top of the raw image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router with every route and middleware mounted.
pub fn build_router(core: Arc<CoreState>) -> Router {
    let body_limit = core.settings.max_image_bytes + MULTIPART_OVERHEAD;
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let diagnostics = Router::new()
        .route("/text", post(endpoints::triage::start_text))
        .route("/image", post(endpoints::triage::start_image))
        .route("/session/:id", get(endpoints::triage::get_session))
        .route("/session/:id/text", post(endpoints::triage::add_text))
        .route("/session/:id/answer", post(endpoints::triage::answer))
        .route("/session/:id/finalize", post(endpoints::triage::finalize));

    let mental_health = Router::new()
        .route("/chat/message", post(endpoints::wellbeing::chat_message))
        .route("/checkin/today", get(endpoints::wellbeing::checkin_today))
        .route("/checkin/submit", post(endpoints::wellbeing::checkin_submit));

    Router::new()
        .route("/health", get(endpoints::health::check))
        .nest("/diagnostics/triage", diagnostics)
        .nest("/mental-health", mental_health)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}
