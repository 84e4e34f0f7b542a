//! # Axum Helpers
//!
//! Shared HTTP plumbing for the workspace's Axum services.
//!
//! ## Modules
//!
//! - **[`extractors`]**: request extractors with uniform JSON error bodies
//!   (validated JSON payloads, UUID path segments)
//! - **[`server`]**: startup, health/readiness routers, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, health_router};
//! use core_config::{app_info, server::ServerConfig, FromEnv};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new().merge(health_router(app_info!()));
//!     create_app(router, &ServerConfig::from_env()?).await?;
//!     Ok(())
//! }
//! ```

pub mod extractors;
pub mod server;

// Re-export server types
pub use server::{
    create_app, create_production_app, health_router, run_health_checks, shutdown_signal,
    HealthCheckFuture, HealthResponse, ShutdownCoordinator,
};

// Re-export extractors
pub use extractors::{UuidPath, ValidatedJson};
