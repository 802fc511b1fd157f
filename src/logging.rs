//! Tracing subscriber setup.

use tracing::Level;
use tracing_subscriber::EnvFilter;

type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Console logging to stderr so stdout stays free for command output.
///
/// `RUST_LOG` overrides the level picked from `verbose`. Fails if a global
/// subscriber is already installed.
pub fn setup_logging(verbose: bool) -> Result<(), InitError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}
