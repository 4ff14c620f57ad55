//! Subscriber setup for the binary

use crate::cli::LogLevel;
use intercept_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Apply command-line overrides to the configured logging.
///
/// `--log-level` wins over `--verbose`, which wins over the config file.
pub fn effective(config: &LoggingConfig, level: Option<LogLevel>, verbose: bool) -> LoggingConfig {
    let override_level = level.or(verbose.then_some(LogLevel::Debug));
    match override_level {
        Some(level) => LoggingConfig {
            level: level.as_str().to_string(),
            ..config.clone()
        },
        None => config.clone(),
    }
}

/// Install the global subscriber. Logs go to stderr.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::new(config.directive());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_precedence() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
        };

        assert_eq!(effective(&config, None, false).level, "warn");
        assert_eq!(effective(&config, None, true).level, "debug");
        assert_eq!(effective(&config, Some(LogLevel::Trace), true).level, "trace");
        assert_eq!(effective(&config, Some(LogLevel::Off), false).format, LogFormat::Json);
    }
}
