use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the meldingen service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeldingenConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Submission token and public id settings
    pub token: TokenConfig,
    /// Where meldingen are stored
    pub store: StoreConfig,
    /// Path to the classification catalog (TOML)
    pub catalog_path: PathBuf,
    /// Database settings (optional, used by the sqlite store)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Length of the generated submission token
    pub length: usize,
    /// How long a melder may keep working on a melding
    pub duration_minutes: i64,
    /// Length of the public reference handed to the melder
    pub public_id_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory for the file backend
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for MeldingenConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
            token: TokenConfig {
                length: 43,
                duration_minutes: 180, // 3 hours
                public_id_length: 6,
            },
            store: StoreConfig {
                backend: StoreBackend::File,
                path: PathBuf::from(".meldingen/store"),
            },
            catalog_path: PathBuf::from("catalog.toml"),
            database: Some(DatabaseConfig {
                url: "sqlite://.meldingen/meldingen.db".to_string(),
                auto_migrate: true,
            }),
        }
    }
}

impl MeldingenConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (meldingen.toml)
    /// 3. Environment variables (prefixed with MELDINGEN_, nested keys joined by __)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("meldingen.toml").exists() {
            builder = builder.add_source(File::with_name("meldingen"));
        }

        builder = builder.add_source(
            Environment::with_prefix("MELDINGEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: MeldingenConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.token.length < 16 {
            anyhow::bail!("token.length must be at least 16, got {}", self.token.length);
        }
        if self.token.duration_minutes <= 0 {
            anyhow::bail!("token.duration_minutes must be positive");
        }
        if self.token.public_id_length == 0 {
            anyhow::bail!("token.public_id_length must be positive");
        }
        if self.store.backend == StoreBackend::Sqlite && self.database.is_none() {
            anyhow::bail!("the sqlite store needs a [database] section");
        }
        Ok(())
    }

    pub fn token_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token.duration_minutes)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<MeldingenConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = MeldingenConfig::load_env_file();
        MeldingenConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static MeldingenConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
