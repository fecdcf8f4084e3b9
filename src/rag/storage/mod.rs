//! Persistent storage for the vector index.

pub mod build_lock;
pub mod trend_index;

pub use build_lock::BuildLock;
pub use trend_index::{IndexInfo, TrendIndex};
