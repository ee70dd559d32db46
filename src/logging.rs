//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize tracing with a stderr `fmt` layer.
///
/// - Filter: `RUST_LOG` if set, else the configured directives
/// - Output: compact human-readable, or JSON lines when `json` is set
///
/// Output goes to stderr so the terminal transcript on stdout stays clean.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    tracing::debug!(json = config.json, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_error_instead_of_panicking() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
