use thiserror::Error;

use crate::ports::{ConfigError, RepositoryError};

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Application error: {0}")]
    Application(String),

    #[error("Authentication required")]
    AuthenticationRequired,
}

pub type AppResult<T> = Result<T, AppError>;
