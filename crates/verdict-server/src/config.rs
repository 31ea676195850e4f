//! Server configuration

use serde::{Deserialize, Serialize};

/// Server configuration, loaded from `config/server.*` and `VERDICT_*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host (127.0.0.1 for localhost only, 0.0.0.0 for all interfaces)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL connection URL; when unset the server keeps definitions
    /// in memory
    #[serde(default)]
    pub database_url: Option<String>,

    /// Connection pool size for the database
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    25
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            db_max_connections: default_db_max_connections(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("VERDICT"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("failed to deserialize config: {e}")),
            Err(_) => {
                tracing::info!("no config file found, using default configuration");
                Ok(Self::default())
            }
        }
    }
}
