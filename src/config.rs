use std::path::PathBuf;

use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings read from the environment at startup. Command-line flags
/// override these in the binary.
#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: Level,
    /// Auth subject the shell acts as when `--as` is not given.
    pub subject: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, reading a `.env`
    /// file first outside of tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let db_path = std::env::var("CONEXION_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".data").join("conexion.db"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_level = parse_level(&log_level_str)?;

        let subject = std::env::var("CONEXION_SUBJECT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            db_path,
            log_level,
            subject,
        })
    }
}

fn parse_level(s: &str) -> Result<Level, ConfigError> {
    s.parse::<Level>().map_err(|_| {
        ConfigError::InvalidValue(
            "RUST_LOG".to_string(),
            format!("'{}' is not a valid log level", s),
        )
    })
}
