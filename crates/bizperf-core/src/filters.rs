//! Period filtering for table queries
//!
//! Every report is requested for one year and a set of months. The same
//! filter is handed to each repository, which returns only matching rows.
//!
//! # Examples
//!
//! ```
//! use bizperf_core::filters::PeriodFilter;
//!
//! // First quarter of 2024
//! let filter = PeriodFilter::new(2024).with_months([1, 2, 3]).unwrap();
//! assert!(filter.matches(2024, 2));
//! assert!(!filter.matches(2024, 4));
//! assert!(!filter.matches(2023, 1));
//! ```

use crate::error::{BizperfError, Result};
use std::collections::BTreeSet;

/// Year plus month selection
///
/// An empty month set selects the whole year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodFilter {
    /// Selected year
    pub year: i32,
    /// Selected months (1-12); empty means all
    pub months: BTreeSet<u32>,
}

impl PeriodFilter {
    /// Create a filter selecting every month of `year`
    pub fn new(year: i32) -> Self {
        Self {
            year,
            months: BTreeSet::new(),
        }
    }

    /// Restrict the filter to the given months
    pub fn with_months(mut self, months: impl IntoIterator<Item = u32>) -> Result<Self> {
        for month in months {
            if !(1..=12).contains(&month) {
                return Err(BizperfError::InvalidPeriod(format!(
                    "month must be between 1-12, got {month}"
                )));
            }
            self.months.insert(month);
        }
        Ok(self)
    }

    /// Check whether a row dated `(year, month)` passes the filter
    pub fn matches(&self, year: i32, month: u32) -> bool {
        year == self.year && (self.months.is_empty() || self.months.contains(&month))
    }

    /// The selected months, expanded to 1..=12 when none were given
    pub fn selected_months(&self) -> Vec<u32> {
        if self.months.is_empty() {
            (1..=12).collect()
        } else {
            self.months.iter().copied().collect()
        }
    }
}

/// Parse a month list such as `1,2,3` or `1-3,7`
///
/// # Examples
///
/// ```
/// use bizperf_core::filters::parse_months;
///
/// assert_eq!(parse_months("1-3,7").unwrap(), vec![1, 2, 3, 7]);
/// assert!(parse_months("0").is_err());
/// assert!(parse_months("5-2").is_err());
/// ```
pub fn parse_months(spec: &str) -> Result<Vec<u32>> {
    let mut months = BTreeSet::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_month(a)?, parse_month(b)?),
            None => {
                let m = parse_month(part)?;
                (m, m)
            }
        };
        if start > end {
            return Err(BizperfError::InvalidPeriod(format!(
                "month range '{part}' is reversed"
            )));
        }
        months.extend(start..=end);
    }

    Ok(months.into_iter().collect())
}

fn parse_month(s: &str) -> Result<u32> {
    let month = s
        .trim()
        .parse::<u32>()
        .map_err(|_| BizperfError::InvalidPeriod(format!("invalid month '{s}'")))?;
    if !(1..=12).contains(&month) {
        return Err(BizperfError::InvalidPeriod(format!(
            "month must be between 1-12, got {month}"
        )));
    }
    Ok(month)
}
