use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Nothing in this application is readable without a session; only the liveness
/// probe is exposed.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Used by load balancers; never touches the database.
        .route("/health", get(|| async { "ok" }))
}
