pub mod task_cache;

pub use task_cache::TaskCache;
