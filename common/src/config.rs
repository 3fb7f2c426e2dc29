// common/src/config.rs
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Central configuration for the shell client and the API server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub shell: ShellConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub bot: BotConfig,
}

/// Options consumed by the shell client runtime
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Base URL for backend data endpoints
    pub api_base_url: String,
    /// Origin that view bundles are fetched from
    pub asset_base_url: String,
    /// Enables the dev-bypass identity when no host runtime is present
    pub dev_mode_enabled: bool,
    /// Registered views: name -> resource base path
    pub views: HashMap<String, String>,
}

/// Header names and tokens shared by both sides of the auth handshake
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the host-signed init data (host mode)
    pub identity_header: String,
    /// Header carrying the dev-bypass token (dev mode)
    pub dev_auth_header: String,
    /// Fixed bypass token; meaningless unless the server opts in
    pub dev_auth_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
    /// The server's own opt-in for accepting the dev-bypass header.
    /// The client cannot prove it runs outside production, so this
    /// must never be enabled there.
    pub accept_dev_auth: bool,
    pub static_files: StaticFilesConfig,
}

/// Chat-bot webhook settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token; webhook processing is refused while this is empty
    pub token: String,
    /// Bot API origin
    pub api_base: String,
    /// URL the bot's welcome keyboard opens the mini-app at
    pub front_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_age: u32,
    pub must_revalidate: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut views = HashMap::new();
        views.insert("main".to_string(), "pages/main".to_string());
        views.insert("profile".to_string(), "pages/profile".to_string());

        Self {
            shell: ShellConfig {
                api_base_url: "http://127.0.0.1:8081/api".to_string(),
                asset_base_url: "http://127.0.0.1:8081".to_string(),
                dev_mode_enabled: false,
                views,
            },
            auth: AuthConfig {
                identity_header: "X-Telegram-Init-Data".to_string(),
                dev_auth_header: "X-Dev-Auth".to_string(),
                dev_auth_token: "dev_token".to_string(),
            },
            server: ServerConfig {
                addr: "127.0.0.1:8081".to_string(),
                accept_dev_auth: false,
                static_files: StaticFilesConfig {
                    path: "./static".to_string(),
                    index: "index.html".to_string(),
                    cache: CacheConfig {
                        max_age: 3600,
                        must_revalidate: true,
                    },
                },
            },
            bot: BotConfig {
                token: String::new(),
                api_base: "https://api.telegram.org".to_string(),
                front_url: "http://127.0.0.1:8081".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        // Build configuration
        let config = ConfigFile::builder()
            // Start with defaults
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add environment specific config
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Add a local config file for local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix "APP"
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Build and deserialize
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files when possible, falling back to built-in defaults
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to built-in defaults");
                Self::default()
            }
        }
    }
}
