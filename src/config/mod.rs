// Configuration module entry point
// Loads application configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::Path;

// Re-export public types
pub use state::AppState;
pub use types::{AppConfig, Config, MessageStyle};

/// Environment variable that switches the `/json` message style
pub const MESSAGE_STYLE_VAR: &str = "MESSAGE_STYLE";

/// Load a `.env` file into the process environment
///
/// `None` searches the working directory and its parents for `.env`.
/// Variables already set in the environment keep their value, and a missing
/// file is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::build(config_path, std::env::var(MESSAGE_STYLE_VAR).ok())
    }

    /// Build configuration with an explicit `MESSAGE_STYLE` value
    ///
    /// The bare variable is not namespaced, so it is layered on top of the
    /// file and `SERVER__` environment sources as an override.
    pub fn build(
        config_path: &str,
        message_style: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.request_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "express-router/0.1")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("app.views_dir", "views")?
            .set_default("app.public_dir", "public")?
            .set_default("app.public_mount", "/public")?
            .set_override_option("app.message_style", message_style)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
