// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub app: AppConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Log `METHOD /path - ip` for every request from the application middleware
    pub request_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Application configuration read by route handlers
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Raw `MESSAGE_STYLE` value
    #[serde(default)]
    pub message_style: Option<String>,
    /// Directory holding `index.html`
    pub views_dir: String,
    /// Directory served under `public_mount`
    pub public_dir: String,
    pub public_mount: String,
}

/// How `/json` renders its message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    Uppercase,
    Plain,
}

impl AppConfig {
    /// Only the exact value `uppercase` switches the style.
    pub fn message_style(&self) -> MessageStyle {
        match self.message_style.as_deref() {
            Some("uppercase") => MessageStyle::Uppercase,
            _ => MessageStyle::Plain,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            message_style: None,
            views_dir: "views".to_string(),
            public_dir: "public".to_string(),
            public_mount: "/public".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_style(style: Option<&str>) -> AppConfig {
        AppConfig {
            message_style: style.map(String::from),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_message_style_uppercase() {
        assert_eq!(
            with_style(Some("uppercase")).message_style(),
            MessageStyle::Uppercase
        );
    }

    #[test]
    fn test_message_style_other_values_pass_through() {
        assert_eq!(with_style(None).message_style(), MessageStyle::Plain);
        assert_eq!(with_style(Some("UPPERCASE")).message_style(), MessageStyle::Plain);
        assert_eq!(with_style(Some("")).message_style(), MessageStyle::Plain);
    }
}
