use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub username: Option<String>,
    pub page_size: u32,
    pub cache_ttl_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001/api".to_string(),
            username: None,
            page_size: 10,
            cache_ttl_seconds: 300, // 5 minutes
        }
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_config(&self) -> ConfigResult<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()>;
    async fn get_api_token(&self) -> ConfigResult<Option<String>>;
    async fn set_api_token(&self, token: &str) -> ConfigResult<()>;
    async fn clear_api_token(&self) -> ConfigResult<()>;
}
