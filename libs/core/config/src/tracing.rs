use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre report and panic hooks.
///
/// Call early in `main()`, before anything fallible runs. Safe to call
/// more than once; later calls are no-ops.
///
/// Shows the file:line an error originated from and hides the environment
/// section of the report.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize the global tracing subscriber.
///
/// Output format follows the deployment environment:
/// - **Production**: JSON events with flattened fields, targets hidden,
///   ready for log aggregation.
/// - **Development**: pretty-printed, human-readable.
///
/// Both variants install [`tracing_error::ErrorLayer`] so eyre reports can
/// carry span traces.
///
/// The filter comes from `RUST_LOG` when set, otherwise defaults to `info`
/// in production and `debug` in development.
///
/// Safe to call repeatedly; re-initialization is skipped (common in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("debug")
        }
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!("Tracing initialized. Environment: {:?}", environment),
        Err(_) => debug!("Tracing already initialized, skipping"),
    }
}
