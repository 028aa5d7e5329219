pub mod file_store;
pub mod token_store;

pub use file_store::FileConfigStore;
pub use token_store::TokenStore;
