//! Aggregation model: stateful reducers fed by classified log records.
//!
//! Each aggregator is built fresh per reduction and owns its state; nothing
//! survives between two files.

pub mod lifecycle;
pub mod outcome;
pub mod stats;
pub mod workload;

pub use lifecycle::{LifecycleReconstructor, Phase};
pub use outcome::DeadlineAggregator;
pub use workload::WorkloadTracker;
