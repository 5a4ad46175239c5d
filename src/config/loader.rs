//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstream.origin, "http://127.0.0.1:3000");
        assert_eq!(
            config.rewriter.script_allow_origin,
            "https://challenges.cloudflare.com"
        );
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            origin = "http://10.0.0.5:8000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.origin, "http://10.0.0.5:8000");
        assert_eq!(config.upstream.connect_timeout_secs, 5);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [timeouts]
            request_secs = 0

            [rewriter]
            max_html_body_bytes = 0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("timeouts.request_secs must be greater than zero"));
        assert!(message.contains("rewriter.max_html_body_bytes must be greater than zero"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
