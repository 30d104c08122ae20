//! Data Transfer Objects passed from callers into the engine
//!
//! Filters are plain value types: every field is optional and an absent
//! field places no constraint on the query.

pub mod filter;
