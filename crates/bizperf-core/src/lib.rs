//! Core types, traits, and utilities for bizperf
//!
//! This crate provides the domain records, master data, error handling,
//! period filters, aggregation output types, and the repository traits
//! implemented by storage backends.

pub mod aggregation_types;
pub mod error;
pub mod filters;
pub mod repository;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{BizperfError, Result};
pub use filters::PeriodFilter;
pub use types::{GroupKey, Period, RecordId};
