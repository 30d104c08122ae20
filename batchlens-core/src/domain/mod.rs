//! Core domain types
//!
//! This module contains the core domain structures used across Batchlens crates.
//! Data source configurations are owned by the engine's registry; execution
//! records are read-only snapshots of the monitored metadata schema.

pub mod datasource;
pub mod job;
pub mod statistics;
pub mod step;
