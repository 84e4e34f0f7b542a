//! PostgreSQL connector: pool configuration, connect-with-retry, migration
//! runner, and the readiness probe.

mod config;
mod connector;
mod health;

pub use config::PostgresConfig;
pub use connector::{
    connect, connect_from_config, connect_from_config_with_retry, connect_with_options,
    run_migrations,
};
pub use health::check_health;

// Re-export SeaORM types so callers don't need a direct sea-orm dependency
// just to hold a connection
pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
pub use sea_orm_migration::MigratorTrait;
