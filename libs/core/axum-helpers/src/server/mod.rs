//! Server infrastructure module.
//!
//! This module provides:
//! - Health and readiness endpoints
//! - Server startup with graceful shutdown
//! - Shutdown coordination for connection cleanup
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_app, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let app = api_routes.merge(health_router(app_info!()));
//! create_app(app, &ServerConfig::default()).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_production_app};
pub use health::{health_router, run_health_checks, HealthCheckFuture, HealthResponse};
pub use shutdown::{coordinated_shutdown, shutdown_signal, ShutdownCoordinator};
