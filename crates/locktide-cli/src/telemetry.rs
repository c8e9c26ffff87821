//! Logging initialization.
//!
//! Structured logging with tracing, pretty for terminals or JSON for
//! collectors. Logs go to stderr so command output stays pipeable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber. `RUST_LOG` overrides `log_level`.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_once() {
        assert!(init_telemetry("info", false).is_ok());
        // the global subscriber can only be installed once
        assert!(init_telemetry("info", true).is_err());
    }
}
