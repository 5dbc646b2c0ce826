//! # Logging
//!
//! `tracing-subscriber` setup. `RUST_LOG` wins over the configured level when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cloud_resource_provider={}", log_level.to_lowercase()).into()
    })
}

/// Install the global subscriber
///
/// `log_format` is `json` or `text`; anything else falls back to text.
///
/// # Errors
/// A global subscriber is already installed.
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(true);

    let result = if log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

/// Like [`init_logging`] but tolerates an already-installed subscriber
///
/// Returns whether this call installed it.
pub fn try_init_logging(log_level: &str, log_format: &str) -> bool {
    init_logging(log_level, log_format).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_tolerated() {
        let _ = try_init_logging("INFO", "text");
        assert!(!try_init_logging("DEBUG", "json"));
    }
}
