//! Service Module
//!
//! Read-side logic of the engine.
//! Services resolve a data source id to a pooled connection and delegate
//! to the repositories.

pub mod query;
pub mod statistics;

// Re-export for convenience
pub use query::QueryEngine;
pub use statistics::StatisticsAggregator;
