//! API routes module

pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Creates the API routes without the `/api` prefix.
///
/// Returns a stateless Router; all sub-routers have state already applied.
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/users", users::router(state))
}

/// Creates a router with the `/ready` endpoint that performs actual health checks.
pub fn ready_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
