//! bizperf - Business performance reports for a services organization
//!
//! This library provides functionality to:
//! - Roll revenue, salary and overhead rows up into per-period summaries
//!   grouped by company, division, or customer within company
//! - Allocate the overhead pool by BMM and apply per-report bonus policies
//! - Load the input tables concurrently and keep the freshest report
//! - Render reports as tables or JSON and export them to CSV
//! - Import revenue rows from CSV files keyed by master-data codes
//!
//! # Examples
//!
//! ```no_run
//! use bizperf::{
//!     aggregation_types::ReportKind,
//!     filters::PeriodFilter,
//!     loader::{ReportLoader, ReportRequest, Repositories},
//!     output::get_formatter,
//! };
//! use bizperf_store::JsonStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> bizperf::Result<()> {
//!     let store = Arc::new(JsonStore::open(None).await?);
//!     let loader = ReportLoader::new(Repositories::from_store(store));
//!
//!     let filter = PeriodFilter::new(2024).with_months([1, 2, 3])?;
//!     let report = loader
//!         .refresh(&ReportRequest::new(ReportKind::Company, filter))
//!         .await?;
//!
//!     println!("{}", get_formatter(false, true).format_report(&report));
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod export;
pub mod import;
pub mod loader;
pub mod output;

pub use bizperf_core::{aggregation_types, error, filters, repository, types};

// Re-export commonly used types
pub use error::{BizperfError, Result};
pub use types::{GroupKey, Period, RecordId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
