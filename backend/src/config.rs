//! Configuration management for the Kitchen Stock back office
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with KS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// External identity provider
    pub identity: IdentityConfig,

    /// Object storage for receipt photos
    pub storage: StorageConfig,

    /// Offline sales ingestion pipeline
    pub pipeline: PipelineConfig,

    pub restaurant: RestaurantConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// Shared secret the provider signs bearer tokens with
    pub jwt_secret: String,

    /// Expected `iss` claim, when the provider sets one
    pub issuer: Option<String>,

    /// Base URL of the provider's admin API
    pub api_url: String,

    /// Admin API key
    pub api_key: String,

    /// Where invited staff land after setting their password
    pub invite_redirect_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base URL objects are uploaded to
    pub base_url: String,

    pub bucket: String,

    /// Base URL objects are publicly served from
    pub public_base_url: String,

    /// Secret used to sign upload requests
    pub signing_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Interpreter or executable that runs the pipeline
    pub command: String,

    /// Script passed as the first argument
    pub script: String,

    pub timeout_secs: u64,

    /// Directory uploaded spreadsheets are staged in
    pub tmp_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestaurantConfig {
    /// Name printed on supplier orders
    pub name: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("KS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("identity.api_url", "http://localhost:9099")?
            .set_default("identity.api_key", "")?
            .set_default("identity.invite_redirect_url", "http://localhost:5173/login")?
            .set_default("storage.base_url", "http://localhost:9000")?
            .set_default("storage.bucket", "kitchen-stock")?
            .set_default("storage.public_base_url", "http://localhost:9000/kitchen-stock")?
            .set_default("storage.signing_secret", "")?
            .set_default("pipeline.command", "python3")?
            .set_default("pipeline.script", "tools/vendas/process_sales_upload.py")?
            .set_default("pipeline.timeout_secs", 120)?
            .set_default("pipeline.tmp_dir", ".tmp/uploads")?
            .set_default("restaurant.name", "Restaurante")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (KS_ prefix)
            .add_source(
                Environment::with_prefix("KS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
