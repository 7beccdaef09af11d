//! Aggregation data types for bizperf
//!
//! Pure data structures produced by the period aggregator. Stored figures
//! (BMM, revenue, salary, overhead, bonus) live on [`PeriodSummary`];
//! derived figures (total cost, profit, profit %) are computed when a
//! summary is finalized into a [`ReportLine`] and are never stored.

use crate::types::{GroupKey, Period};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four performance reports
///
/// # Examples
/// ```
/// use bizperf_core::aggregation_types::ReportKind;
/// use std::str::FromStr;
///
/// let kind = ReportKind::from_str("Customer").unwrap();
/// assert_eq!(kind, ReportKind::Customer);
/// assert_eq!(kind.to_string(), "customer");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// One line per company per month
    Company,
    /// One line per division per month
    Division,
    /// One line per customer within company per month
    Customer,
    /// One line per month for the whole organization
    Business,
}

impl ReportKind {
    /// Bonus policy each report uses
    ///
    /// Company and division reports read the per-BMM rate tables; the
    /// customer report applies a caller-supplied percent of salary.
    pub fn bonus_policy(&self, salary_percent: f64) -> BonusPolicy {
        match self {
            ReportKind::Company | ReportKind::Division | ReportKind::Business => {
                BonusPolicy::PerBmmRate
            }
            ReportKind::Customer => BonusPolicy::SalaryPercent(salary_percent),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Company => "company",
            ReportKind::Division => "division",
            ReportKind::Customer => "customer",
            ReportKind::Business => "business",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(Self::Company),
            "division" => Ok(Self::Division),
            "customer" => Ok(Self::Customer),
            "business" => Ok(Self::Business),
            _ => Err(format!(
                "Invalid report: {s}. Valid options are: company, division, customer, business"
            )),
        }
    }
}

/// How a line's bonus is obtained
///
/// The two policies coexist on purpose and must not be merged into one
/// formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BonusPolicy {
    /// `bmm * bn_bmm` from the bonus rate table, accumulated per revenue row
    PerBmmRate,
    /// `salary_cost * percent / 100` applied at finalize time
    SalaryPercent(f64),
}

/// Stored figures for one `(period, group)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Year and month
    pub period: Period,
    /// Grouping key
    pub group: GroupKey,
    /// Display code used for sorting
    pub code: String,
    /// Display name, empty when master data has none
    pub name: String,
    /// Billable man-months
    pub bmm: f64,
    /// Revenue in VND
    pub revenue: f64,
    /// Salary cost of the group in the period
    pub salary_cost: f64,
    /// Share of the overhead pool, `overhead_per_bmm * bmm`
    pub overhead_cost: f64,
    /// Bonus accumulated from the rate table; `None` when the bonus is a
    /// percent of salary applied at finalize time
    pub bonus_value: Option<f64>,
}

impl PeriodSummary {
    /// Bonus for this summary under the given salary percent
    pub fn bonus(&self, salary_percent: f64) -> f64 {
        self.bonus_value
            .unwrap_or(self.salary_cost * salary_percent / 100.0)
    }

    /// Finalize into a report line with derived figures
    pub fn finalize(self, salary_percent: f64) -> ReportLine {
        let bonus = self.bonus(salary_percent);
        let figures = Figures::derive(
            self.revenue,
            self.salary_cost,
            bonus,
            self.overhead_cost,
        );
        ReportLine {
            summary: self,
            bonus,
            total_cost: figures.total_cost,
            profit: figures.profit,
            profit_percent: figures.profit_percent,
        }
    }
}

/// Derived figures shared by lines and totals
#[derive(Debug, Clone, Copy, PartialEq)]
struct Figures {
    total_cost: f64,
    profit: f64,
    profit_percent: Option<f64>,
}

impl Figures {
    fn derive(revenue: f64, salary: f64, bonus: f64, overhead: f64) -> Self {
        let total_cost = salary + bonus + overhead;
        let profit = revenue - total_cost;
        Self {
            total_cost,
            profit,
            profit_percent: profit_percent(revenue, profit),
        }
    }
}

/// `profit / revenue * 100`, or `None` when revenue is exactly zero
///
/// `None` renders as `-`, distinct from a true 0% margin.
pub fn profit_percent(revenue: f64, profit: f64) -> Option<f64> {
    if revenue == 0.0 {
        None
    } else {
        Some(profit / revenue * 100.0)
    }
}

/// A finalized report line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(flatten)]
    pub summary: PeriodSummary,
    /// Bonus after applying the report's policy
    pub bonus: f64,
    /// Salary + bonus + overhead
    pub total_cost: f64,
    /// Revenue - total cost
    pub profit: f64,
    /// `None` when revenue is zero
    pub profit_percent: Option<f64>,
}

/// Column sums over a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub bmm: f64,
    pub revenue: f64,
    pub salary_cost: f64,
    pub overhead_cost: f64,
    pub bonus: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_percent: Option<f64>,
}

impl Totals {
    pub fn from_lines(lines: &[ReportLine]) -> Self {
        let mut totals = Self::default();
        for line in lines {
            totals.bmm += line.summary.bmm;
            totals.revenue += line.summary.revenue;
            totals.salary_cost += line.summary.salary_cost;
            totals.overhead_cost += line.summary.overhead_cost;
            totals.bonus += line.bonus;
            totals.total_cost += line.total_cost;
            totals.profit += line.profit;
        }
        totals.profit_percent = profit_percent(totals.revenue, totals.profit);
        totals
    }
}

/// A complete report: lines in display order plus totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub year: i32,
    pub months: Vec<u32>,
    pub lines: Vec<ReportLine>,
    pub totals: Totals,
}

impl Report {
    pub fn new(kind: ReportKind, year: i32, months: Vec<u32>, lines: Vec<ReportLine>) -> Self {
        let totals = Totals::from_lines(&lines);
        Self {
            kind,
            year,
            months,
            lines,
            totals,
        }
    }
}
