use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::ports::{AppConfig, ConfigError, ConfigResult, ConfigStore};

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    username: Option<String>,
    page_size: Option<u32>,
    cache_ttl_seconds: Option<u64>,
}

pub struct FileConfigStore {
    config_path: PathBuf,
    keyring_service: String,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;

        let app_config_dir = config_dir.join("taskboard-cli");
        let config_path = app_config_dir.join("config.json");

        Ok(Self {
            config_path,
            keyring_service: "taskboard-cli".to_string(),
        })
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        Ok(())
    }

    fn token_file_path(&self) -> PathBuf {
        self.config_path.parent().unwrap().join(".token")
    }

    async fn get_token_from_file(&self) -> ConfigResult<Option<String>> {
        let token_path = self.token_file_path();
        match fs::read_to_string(&token_path).await {
            Ok(token) => Ok(Some(token.trim().to_string())),
            Err(_) => Ok(None), // File doesn't exist or can't be read
        }
    }

    async fn set_token_in_file(&self, token: &str) -> ConfigResult<()> {
        self.ensure_config_dir().await?;
        let token_path = self.token_file_path();
        fs::write(&token_path, token)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        // Restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&token_path)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&token_path, perms)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(_) => return Ok(AppConfig::default()),
        };

        let config_file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let defaults = AppConfig::default();
        Ok(AppConfig {
            api_base_url: config_file.api_base_url.unwrap_or(defaults.api_base_url),
            username: config_file.username,
            page_size: config_file.page_size.unwrap_or(defaults.page_size),
            cache_ttl_seconds: config_file
                .cache_ttl_seconds
                .unwrap_or(defaults.cache_ttl_seconds),
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let config_file = ConfigFile {
            api_base_url: Some(config.api_base_url.clone()),
            username: config.username.clone(),
            page_size: Some(config.page_size),
            cache_ttl_seconds: Some(config.cache_ttl_seconds),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    async fn get_api_token(&self) -> ConfigResult<Option<String>> {
        // Environment variable wins, then keyring, then the fallback file.
        if let Ok(env_token) = std::env::var("TASKBOARD_TOKEN") {
            return Ok(Some(env_token));
        }

        match keyring::Entry::new(&self.keyring_service, "api_token") {
            Ok(entry) => match entry.get_password() {
                Ok(token) => return Ok(Some(token)),
                Err(keyring::Error::NoEntry) => {}
                Err(_) => {
                    tracing::warn!("Keyring not available, falling back to file storage");
                }
            },
            Err(_) => {
                tracing::warn!("Keyring service not available, falling back to file storage");
            }
        }

        self.get_token_from_file().await
    }

    async fn set_api_token(&self, token: &str) -> ConfigResult<()> {
        match keyring::Entry::new(&self.keyring_service, "api_token") {
            Ok(entry) => match entry.set_password(token) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    tracing::warn!("Failed to store in keyring, falling back to file storage");
                }
            },
            Err(_) => {
                tracing::warn!("Keyring not available, using file storage");
            }
        }

        self.set_token_in_file(token).await
    }

    async fn clear_api_token(&self) -> ConfigResult<()> {
        if let Ok(entry) = keyring::Entry::new(&self.keyring_service, "api_token") {
            // NoEntry is fine; anything else falls through to the file cleanup
            let _ = entry.delete_credential();
        }

        let token_path = self.token_file_path();
        match fs::remove_file(&token_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::WriteError(e.to_string())),
        }
    }
}
