//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: Level,

    // Direct AI provider credentials. All optional: an analysis request for
    // an unconfigured provider fails at call time, not at startup.
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    pub gemini_model: String,

    // Pica gateway credentials for the passthrough integrations.
    pub pica_secret_key: Option<String>,
    pub mailgun_connection_key: Option<String>,
    pub twilio_connection_key: Option<String>,
    pub serp_connection_key: Option<String>,
    pub firecrawl_connection_key: Option<String>,
    pub meta_connection_key: Option<String>,
    pub mailgun_endpoint: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Storage Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load AI Provider Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let openai_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string());
        let anthropic_model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-3-sonnet-20240229".to_string());
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string());

        // --- Load Pica Gateway Settings ---
        let pica_secret_key = std::env::var("PICA_SECRET_KEY").ok();
        let mailgun_connection_key = std::env::var("PICA_MAILGUN_CONNECTION_KEY").ok();
        let twilio_connection_key = std::env::var("PICA_TWILIO_CONNECTION_KEY").ok();
        let serp_connection_key = std::env::var("PICA_SERP_API_CONNECTION_KEY").ok();
        let firecrawl_connection_key = std::env::var("PICA_FIRECRAWL_CONNECTION_KEY").ok();
        let meta_connection_key = std::env::var("PICA_META_CONNECTION_KEY").ok();
        let mailgun_endpoint = std::env::var("MAILGUN_ENDPOINT")
            .unwrap_or_else(|_| "https://api.picaos.com/v1/passthrough".to_string());

        Ok(Self {
            bind_address,
            data_dir,
            log_level,
            openai_api_key,
            anthropic_api_key,
            gemini_api_key,
            openai_model,
            anthropic_model,
            gemini_model,
            pica_secret_key,
            mailgun_connection_key,
            twilio_connection_key,
            serp_connection_key,
            firecrawl_connection_key,
            meta_connection_key,
            mailgun_endpoint,
        })
    }
}
