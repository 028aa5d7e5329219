pub mod config_store;
pub mod credentials;
pub mod task_repository;

pub use config_store::*;
pub use credentials::*;
pub use task_repository::*;
