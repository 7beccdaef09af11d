//! CLI interface for bizperf
//!
//! This module defines the command-line interface using clap. Reports are
//! computed from the tables in the data directory; the table commands list,
//! add, and delete individual rows.
//!
//! # Example
//!
//! ```bash
//! # Company performance for the first quarter of 2024
//! bizperf report company --year 2024 --months 1-3
//!
//! # Customer performance with a 10% salary bonus, exported to ./out
//! bizperf report customer --year 2024 --bonus-percent 10 --export out
//!
//! # Load companies, divisions and customers, then import revenue rows
//! bizperf master import master.json
//! bizperf revenue import revenues.csv
//!
//! # Write the revenue table back out in the same CSV layout
//! bizperf revenue export --year 2024 out
//! ```

use bizperf_core::aggregation_types::ReportKind;
use bizperf_core::error::Result;
use bizperf_core::filters::{PeriodFilter, parse_months};
use bizperf_core::types::{BonusScope, RecordId};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Business performance reports over revenue, salary and overhead tables
#[derive(Parser, Debug, Clone)]
#[command(name = "bizperf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the table files
    #[arg(long, global = true, env = "BIZPERF_DATA_PATH")]
    pub data_dir: Option<PathBuf>,

    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Year plus optional month selection
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Year to report on
    #[arg(long, short = 'y')]
    pub year: i32,

    /// Months as a list or ranges, e.g. `1,2,3` or `1-3,7` (default: all)
    #[arg(long, short = 'm')]
    pub months: Option<String>,
}

impl PeriodArgs {
    /// Build the period filter, validating the month list
    pub fn filter(&self) -> Result<PeriodFilter> {
        let months = match &self.months {
            Some(spec) => parse_months(spec)?,
            None => Vec::new(),
        };
        PeriodFilter::new(self.year).with_months(months)
    }
}

/// Arguments for the report command
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Report to build: company, division, customer, or business
    pub kind: ReportKind,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Bonus as a percent of salary, used by the customer report
    #[arg(long, default_value = "0")]
    pub bonus_percent: f64,

    /// Also write a CSV export into DIR (default: current directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
    pub export: Option<PathBuf>,
}

/// Arguments for adding a revenue row
#[derive(Args, Debug, Clone)]
pub struct RevenueAddArgs {
    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,

    /// Company code
    #[arg(long)]
    pub company: Option<String>,

    /// Division code
    #[arg(long)]
    pub division: Option<String>,

    /// Customer code
    #[arg(long)]
    pub customer: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    /// Billable man-months
    #[arg(long, default_value = "0")]
    pub bmm: f64,

    /// Revenue in VND
    #[arg(long, default_value = "0")]
    pub revenue: f64,

    #[arg(long)]
    pub note: Option<String>,
}

/// Arguments for adding a salary row
#[derive(Args, Debug, Clone)]
pub struct SalaryAddArgs {
    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,

    /// Company code
    #[arg(long)]
    pub company: Option<String>,

    /// Division code
    #[arg(long)]
    pub division: Option<String>,

    /// Customer code
    #[arg(long)]
    pub customer: Option<String>,

    /// Salary amount in VND
    #[arg(long)]
    pub amount: f64,
}

/// Arguments for adding an overhead cost row
#[derive(Args, Debug, Clone)]
pub struct CostAddArgs {
    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,

    #[arg(long)]
    pub description: Option<String>,

    /// Cost in VND
    #[arg(long)]
    pub cost: f64,

    /// Record the row without adding it to the overhead pool
    #[arg(long)]
    pub not_cost: bool,
}

/// Bonus rate table selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    Company,
    Division,
}

impl From<ScopeArg> for BonusScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Company => BonusScope::Company,
            ScopeArg::Division => BonusScope::Division,
        }
    }
}

/// Revenue table commands
#[derive(Subcommand, Debug, Clone)]
pub enum RevenueCommand {
    /// List revenue rows
    List(PeriodArgs),
    /// Add one revenue row
    Add(RevenueAddArgs),
    /// Import revenue rows from a CSV file (all rows or none)
    Import {
        /// CSV file with a Year,Month,Company,Division,Customer,Project,BMM,Revenue,Note header
        file: PathBuf,
    },
    /// Export revenue rows as CSV in the import layout
    Export {
        #[command(flatten)]
        period: PeriodArgs,
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Delete a revenue row by id
    Delete { id: RecordId },
}

/// Master-data commands
#[derive(Subcommand, Debug, Clone)]
pub enum MasterCommand {
    /// Show companies, divisions and customers
    Show,
    /// Replace all master data from a JSON file
    Import {
        /// JSON file with `companies`, `divisions` and `customers` arrays
        file: PathBuf,
    },
}

/// Salary table commands
#[derive(Subcommand, Debug, Clone)]
pub enum SalaryCommand {
    /// List salary rows
    List(PeriodArgs),
    /// Add one salary row
    Add(SalaryAddArgs),
    /// Delete a salary row by id
    Delete { id: RecordId },
}

/// Overhead cost table commands
#[derive(Subcommand, Debug, Clone)]
pub enum CostCommand {
    /// List cost rows
    List(PeriodArgs),
    /// Add one cost row
    Add(CostAddArgs),
    /// Delete a cost row by id
    Delete { id: RecordId },
}

/// Bonus rate table commands
#[derive(Subcommand, Debug, Clone)]
pub enum BonusCommand {
    /// List bonus rates of one table for a year
    List {
        #[arg(long)]
        year: i32,
        #[arg(long, value_enum)]
        scope: ScopeArg,
    },
    /// Set the per-BMM bonus rate of a company or division
    Set {
        #[arg(long)]
        year: i32,
        #[arg(long, value_enum)]
        scope: ScopeArg,
        /// Company or division code
        #[arg(long)]
        code: String,
        /// Bonus per BMM in VND
        #[arg(long)]
        rate: f64,
    },
    /// Delete a bonus rate by id
    Delete { id: RecordId },
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a performance report
    Report(ReportArgs),
    /// Revenue rows
    #[command(subcommand)]
    Revenue(RevenueCommand),
    /// Salary cost rows
    #[command(subcommand)]
    Salary(SalaryCommand),
    /// Overhead cost rows
    #[command(subcommand)]
    Cost(CostCommand),
    /// Per-BMM bonus rates
    #[command(subcommand)]
    Bonus(BonusCommand),
    /// Company, division and customer lookups
    #[command(subcommand)]
    Master(MasterCommand),
}

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "bizperf=info,bizperf_core=info,bizperf_store=info"
    } else {
        "bizperf=warn,bizperf_core=warn,bizperf_store=warn"
    }
}
