//! HTTP boundary
//!
//! # Endpoints
//!
//! - `POST {prefix}/players/{id}/game-preference`
//! - `POST {prefix}/players/{id}/spending-habits`
//! - `POST {prefix}/players/{id}/value-score`
//! - `GET /health`
//!
//! Every body is wrapped in the `{success, message, data}` envelope.

mod envelope;
mod error;
mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with player routes under `api_prefix`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let players = Router::new()
        .route(
            "/players/{id}/game-preference",
            post(handlers::game_preference),
        )
        .route(
            "/players/{id}/spending-habits",
            post(handlers::spending_habits),
        )
        .route("/players/{id}/value-score", post(handlers::value_score));

    // nest() rejects an empty or root prefix
    let prefix = api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        players
    } else {
        Router::new().nest(prefix, players)
    };

    app.route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
