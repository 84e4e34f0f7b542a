//! Users API routes

use axum::Router;
use domain_users::{handlers, PgUserRepository, UserService};

use crate::state::AppState;

/// Create the users router backed by the PostgreSQL repository
pub fn router(state: &AppState) -> Router {
    let repository = PgUserRepository::new(state.db.clone());
    let service = UserService::new(repository);
    handlers::router(service)
}
