//! JSON file table store for bizperf
//!
//! Each table is a JSON array file in one data directory. The store
//! implements every repository trait from `bizperf-core`.

pub mod store;
pub mod table;

pub use store::JsonStore;
