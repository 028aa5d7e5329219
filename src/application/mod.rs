pub mod error;
pub mod feeds;
pub mod navigation;
pub mod task_service;

pub use error::*;
pub use feeds::*;
pub use navigation::*;
pub use task_service::*;
