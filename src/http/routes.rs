use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::open_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::abandon_session),
        )
        // Refinement loop
        .route("/sessions/:id/messages", post(handlers::send_message))
        .route("/sessions/:id/confirm", post(handlers::confirm_session))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
