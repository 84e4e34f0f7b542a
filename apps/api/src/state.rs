//! Application state management

/// Shared application state
///
/// Cloned per handler; both fields are cheap Arc-backed handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
}
