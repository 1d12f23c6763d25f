//! Log sink setup

use crate::config::LoggingConfig;
use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Install `env_logger` as the global logger
///
/// The configured filter applies unless `RUST_LOG` is set. Fails if a
/// logger was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetLoggerError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(config.filter.as_str()));
    if config.timestamps {
        builder.format_timestamp_millis();
    } else {
        builder.format_timestamp(None);
    }
    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            filter: "warn".to_string(),
            timestamps: false,
        };
        // Another test may already have installed a logger
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
