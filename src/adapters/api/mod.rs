pub mod client;
pub mod dto;
pub mod task_repo;

pub use client::ApiClient;
pub use task_repo::HttpTaskRepository;
