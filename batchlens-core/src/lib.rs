//! Batchlens Core
//!
//! Core types and abstractions for the Batchlens batch-history monitor.
//!
//! This crate contains:
//! - Domain types: data source configurations and the read-only execution
//!   records loaded from the batch metadata tables
//! - DTOs: query filters passed from callers to the engine
//! - Date-time parsing for loosely formatted filter input

pub mod datetime;
pub mod domain;
pub mod dto;
