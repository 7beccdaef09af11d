//! Shared test utilities for unit tests
//!
//! Integration tests (in tests/) cannot access this module because it's
//! marked with #[cfg(test)]; they have their own builders in
//! tests/common/mod.rs.

use crate::aggregation_types::PeriodSummary;
use crate::types::{GroupKey, Period};

/// A company-grouped summary for 2024 with no stored bonus
pub fn summary(
    company: &str,
    month: u32,
    bmm: f64,
    revenue: f64,
    salary_cost: f64,
    overhead_cost: f64,
) -> PeriodSummary {
    PeriodSummary {
        period: Period { year: 2024, month },
        group: GroupKey::Company {
            company_id: company.to_string(),
        },
        code: company.to_string(),
        name: String::new(),
        bmm,
        revenue,
        salary_cost,
        overhead_cost,
        bonus_value: None,
    }
}
