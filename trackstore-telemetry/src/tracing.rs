use std::sync::Once;

use thiserror::Error;
use trackstore_config::Environment;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVE: &str = "info";

/// Third party targets whose output is capped regardless of the default level.
const QUIET_TARGETS: &[(&str, &str)] = &[("sqlx", "warn"), ("sqlx::query", "warn")];

static INIT_TEST_TRACING: Once = Once::new();

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("invalid tracing filter `{filter}`: {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builds the filter from `RUST_LOG`, falling back to `info` with noisy targets capped.
fn build_env_filter() -> Result<EnvFilter, TracingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = vec![DEFAULT_DIRECTIVE.to_string()];
    directives.extend(
        QUIET_TARGETS
            .iter()
            .map(|(target, level)| format!("{target}={level}")),
    );
    let filter = directives.join(",");

    EnvFilter::try_new(&filter).map_err(|source| TracingError::InvalidFilter { filter, source })
}

/// Installs the global subscriber for a binary.
///
/// Development runs get human readable output, production runs emit one JSON object per event
/// so the merge log can be archived next to the stores it touched.
pub fn init_tracing(app_name: &str, environment: Environment) -> Result<(), TracingError> {
    let filter = build_env_filter()?;

    match environment {
        Environment::Dev => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?,
        Environment::Prod => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()?,
    }

    tracing::info!(app = app_name, environment = %environment, "tracing initialized");

    Ok(())
}

/// Installs a subscriber that writes through the test harness, at most once per process.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
