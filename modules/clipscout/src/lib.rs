//! Run orchestration: link collection, the per-video loop, persistence, and
//! the optional risk pass.

pub mod collector;
pub mod harvest;
pub mod stats;

pub use harvest::{Harvester, HarvestRequest};
pub use stats::RunStats;
