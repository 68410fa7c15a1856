//! API configuration

use serde::Deserialize;

use domain_claims::EngineConfig;

/// API configuration
///
/// Read from `API_`-prefixed environment variables; nested keys use `__`,
/// e.g. `API_ENGINE__DIAGNOSIS_MATCH=keyword`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Calculation engine settings
    pub engine: EngineConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/claims".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            log_json: false,
            engine: EngineConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
