use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub scheduler: Option<SchedulerConfig>,
    pub notify: Option<NotifyConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5555,
            }),
            scheduler: Some(SchedulerConfig::default()),
            notify: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// Six-field cron expression (sec min hour day-of-month month day-of-week)
    pub cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 9 * * *".to_string(),
        }
    }
}

/// Notification transport settings. With no `webhook_url` the dispatcher
/// runs in simulated mode and only logs the digest.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifyConfig {
    pub recipient: Option<String>,
    pub webhook_url: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let default_config = r#"
[cors]
allowed_origins = ["http://localhost:3000"]

[server]
host = "127.0.0.1"
port = 5555

[scheduler]
# Six-field cron expression: sec min hour day-of-month month day-of-week.
# Fires the daily follow-up scan at 09:00 server-local time.
cron = "0 0 9 * * *"

# [notify]
# Without a webhook_url the dispatcher simulates delivery (logs only).
# recipient = "sales@example.com"
# webhook_url = "https://hooks.example.com/leads-digest"
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("clms").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
