pub mod buckets;
pub mod staff;
pub mod task;

pub use buckets::*;
pub use staff::*;
pub use task::*;
