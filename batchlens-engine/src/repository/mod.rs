//! Repository Module
//!
//! Read-only data access over the batch metadata tables.
//! Each repository reads one part of the schema through a checked-out
//! [`BatchConnection`](crate::db::BatchConnection) and maps rows to domain types.
//!
//! Columns are aliased in lower case so the same row types decode on
//! every backend.

pub mod job;
pub mod metadata;
pub mod statistics;
pub mod step;

// Re-export for convenience
pub use job as job_repository;
pub use metadata as metadata_repository;
pub use statistics as statistics_repository;
pub use step as step_repository;

/// Row cap for unfiltered listings of recent job executions
pub const RECENT_LIMIT: u32 = 100;

/// Row cap for filtered searches
pub const SEARCH_LIMIT: u32 = 500;

use chrono::NaiveDateTime;

use crate::query::SqlParam;

/// Parse an optional date filter, dropping values that do not parse
fn date_bound(
    value: Option<&str>,
    parse: fn(&str) -> Option<NaiveDateTime>,
    field: &str,
) -> Option<SqlParam> {
    let value = value?;
    match parse(value) {
        Some(at) => Some(SqlParam::Timestamp(at)),
        None => {
            tracing::debug!("Ignoring unparseable {} filter: '{}'", field, value);
            None
        }
    }
}
