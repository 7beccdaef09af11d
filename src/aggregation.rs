//! Period aggregation of revenue, salary, and overhead rows
//!
//! Turns flat transactional rows for one year into one [`PeriodSummary`]
//! per `(year, month, group)`, where the group is a company, a division,
//! or a customer within its company.
//!
//! Overhead has no natural per-group key. For every period the recorded
//! cost pool minus total salary is divided by the period's total BMM, and
//! each group is charged that rate times its own BMM:
//!
//! ```text
//! overhead_per_bmm = bmm == 0 ? 0 : (cost - salary) / bmm
//! ```
//!
//! The rate may be negative when salary exceeds the recorded cost pool.
//!
//! # Examples
//!
//! ```
//! use bizperf::aggregation::{AggregationInput, GroupBy, PeriodAggregator};
//! use bizperf::aggregation_types::BonusPolicy;
//! use bizperf::filters::PeriodFilter;
//! use bizperf::types::{MasterData, OverheadCostRecord, RecordId, RevenueRecord, SalaryCostRecord};
//!
//! let filter = PeriodFilter::new(2024).with_months([1]).unwrap();
//! let revenues = vec![RevenueRecord {
//!     id: RecordId::new(),
//!     year: 2024,
//!     month: 1,
//!     company_id: Some("A".into()),
//!     division_id: None,
//!     customer_id: None,
//!     project_name: None,
//!     quantity: 10.0,
//!     vnd_revenue: 1_000_000.0,
//!     note: None,
//! }];
//! let salaries = vec![SalaryCostRecord {
//!     id: RecordId::new(),
//!     year: 2024,
//!     month: 1,
//!     company_id: Some("A".into()),
//!     division_id: None,
//!     customer_id: None,
//!     amount: 200_000.0,
//! }];
//! let costs = vec![OverheadCostRecord {
//!     id: RecordId::new(),
//!     year: 2024,
//!     month: 1,
//!     description: None,
//!     cost: 300_000.0,
//!     is_cost: true,
//! }];
//! let master = MasterData::default();
//!
//! let input = AggregationInput {
//!     filter: &filter,
//!     revenues: &revenues,
//!     salaries: &salaries,
//!     costs: &costs,
//!     bonus_rates: &[],
//!     master: &master,
//! };
//! let summaries = PeriodAggregator::new(GroupBy::Company, BonusPolicy::PerBmmRate).aggregate(&input);
//!
//! assert_eq!(summaries.len(), 1);
//! assert_eq!(summaries[0].overhead_cost, 100_000.0);
//! ```

use crate::aggregation_types::{
    BonusPolicy, PeriodSummary, Report, ReportKind, ReportLine,
};
use bizperf_core::filters::PeriodFilter;
use bizperf_core::types::{
    BonusRateRecord, BonusScope, GroupKey, MasterData, MasterKind, OverheadCostRecord, Period,
    RevenueRecord, SalaryCostRecord,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Grouping dimension of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Company,
    Division,
    /// Customer within company
    Customer,
}

impl GroupBy {
    /// Extract the grouping key from a row's foreign keys
    ///
    /// Returns `None` when the row lacks the key for this dimension.
    fn key(
        &self,
        company_id: Option<&str>,
        division_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> Option<GroupKey> {
        let present = |id: Option<&str>| id.filter(|s| !s.trim().is_empty()).map(str::to_string);
        match self {
            GroupBy::Company => present(company_id).map(|company_id| GroupKey::Company { company_id }),
            GroupBy::Division => {
                present(division_id).map(|division_id| GroupKey::Division { division_id })
            }
            GroupBy::Customer => present(customer_id).map(|customer_id| GroupKey::Customer {
                customer_id,
                company_id: present(company_id),
            }),
        }
    }

    fn revenue_key(&self, r: &RevenueRecord) -> Option<GroupKey> {
        self.key(
            r.company_id.as_deref(),
            r.division_id.as_deref(),
            r.customer_id.as_deref(),
        )
    }

    fn salary_key(&self, s: &SalaryCostRecord) -> Option<GroupKey> {
        self.key(
            s.company_id.as_deref(),
            s.division_id.as_deref(),
            s.customer_id.as_deref(),
        )
    }

    /// Bonus rate table keyed by this dimension, if any
    fn bonus_scope(&self) -> Option<BonusScope> {
        match self {
            GroupBy::Company => Some(BonusScope::Company),
            GroupBy::Division => Some(BonusScope::Division),
            GroupBy::Customer => None,
        }
    }

    /// Display code and name of a group
    fn label(&self, key: &GroupKey, master: &MasterData) -> (String, String) {
        match key {
            GroupKey::Company { company_id } => (
                master.code_of(MasterKind::Company, company_id),
                master.name_of(MasterKind::Company, company_id),
            ),
            GroupKey::Division { division_id } => (
                master.code_of(MasterKind::Division, division_id),
                master.name_of(MasterKind::Division, division_id),
            ),
            GroupKey::Customer {
                customer_id,
                company_id,
            } => {
                let code = master.code_of(MasterKind::Customer, customer_id);
                let name = master.name_of(MasterKind::Customer, customer_id);
                match company_id {
                    Some(company_id) => (
                        format!("{}/{}", master.code_of(MasterKind::Company, company_id), code),
                        name,
                    ),
                    None => (code, name),
                }
            }
            GroupKey::Organization => (ORGANIZATION_CODE.to_string(), String::new()),
        }
    }
}

impl From<ReportKind> for GroupBy {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Company | ReportKind::Business => GroupBy::Company,
            ReportKind::Division => GroupBy::Division,
            ReportKind::Customer => GroupBy::Customer,
        }
    }
}

/// Code shown on business report lines
pub const ORGANIZATION_CODE: &str = "ALL";

/// Row sets and lookups for one aggregation run
#[derive(Debug, Clone, Copy)]
pub struct AggregationInput<'a> {
    /// Requested year and months
    pub filter: &'a PeriodFilter,
    pub revenues: &'a [RevenueRecord],
    pub salaries: &'a [SalaryCostRecord],
    /// Overhead rows; rows without `is_cost` are ignored
    pub costs: &'a [OverheadCostRecord],
    /// Rates of the table matching the grouping dimension
    pub bonus_rates: &'a [BonusRateRecord],
    pub master: &'a MasterData,
}

/// Replace NaN and infinities with 0
fn finite(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Accumulator for one summary line
struct SummaryAccumulator {
    bmm: f64,
    revenue: f64,
    salary_cost: f64,
    overhead_cost: f64,
    bonus_value: Option<f64>,
}

impl SummaryAccumulator {
    fn new(salary_cost: f64, track_bonus: bool) -> Self {
        Self {
            bmm: 0.0,
            revenue: 0.0,
            salary_cost,
            overhead_cost: 0.0,
            bonus_value: track_bonus.then_some(0.0),
        }
    }

    fn add_revenue(&mut self, quantity: f64, revenue: f64, overhead_rate: f64, bonus_rate: f64) {
        self.bmm += quantity;
        self.revenue += revenue;
        self.overhead_cost += overhead_rate * quantity;
        if let Some(ref mut bonus) = self.bonus_value {
            *bonus += quantity * bonus_rate;
        }
    }

    fn into_summary(self, period: Period, group: GroupKey, code: String, name: String) -> PeriodSummary {
        PeriodSummary {
            period,
            group,
            code,
            name,
            bmm: self.bmm,
            revenue: self.revenue,
            salary_cost: self.salary_cost,
            overhead_cost: self.overhead_cost,
            bonus_value: self.bonus_value,
        }
    }
}

/// Period totals shared by every group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodPools {
    /// Σ salary over all rows of the period
    pub salary: BTreeMap<Period, f64>,
    /// Σ cost over `is_cost` rows of the period
    pub cost: BTreeMap<Period, f64>,
    /// Σ BMM over all revenue rows of the period, keyed or not
    pub bmm: BTreeMap<Period, f64>,
}

impl PeriodPools {
    /// Sum the pools over the filtered rows
    pub fn build(input: &AggregationInput<'_>) -> Self {
        let mut pools = Self::default();
        let filter = input.filter;

        for s in input.salaries.iter().filter(|s| filter.matches(s.year, s.month)) {
            *pools.salary.entry(period_of(s.year, s.month)).or_default() += finite(s.amount);
        }
        for c in input
            .costs
            .iter()
            .filter(|c| c.is_cost && filter.matches(c.year, c.month))
        {
            *pools.cost.entry(period_of(c.year, c.month)).or_default() += finite(c.cost);
        }
        for r in input.revenues.iter().filter(|r| filter.matches(r.year, r.month)) {
            *pools.bmm.entry(period_of(r.year, r.month)).or_default() += finite(r.quantity);
        }

        pools
    }

    /// Overhead rate per BMM for every period with recorded cost
    ///
    /// Periods with zero BMM get rate 0 so their overhead stays unattributed.
    pub fn overhead_rates(&self) -> BTreeMap<Period, f64> {
        self.cost
            .iter()
            .map(|(period, cost)| {
                let bmm = self.bmm.get(period).copied().unwrap_or(0.0);
                let salary = self.salary.get(period).copied().unwrap_or(0.0);
                let rate = if bmm == 0.0 { 0.0 } else { (cost - salary) / bmm };
                (*period, rate)
            })
            .collect()
    }
}

fn period_of(year: i32, month: u32) -> Period {
    Period { year, month }
}

/// Groups rows by one dimension and applies one bonus policy
#[derive(Debug, Clone, Copy)]
pub struct PeriodAggregator {
    group_by: GroupBy,
    bonus_policy: BonusPolicy,
}

impl PeriodAggregator {
    pub fn new(group_by: GroupBy, bonus_policy: BonusPolicy) -> Self {
        Self {
            group_by,
            bonus_policy,
        }
    }

    /// Aggregator configured the way `kind` needs it
    pub fn for_report(kind: ReportKind, salary_percent: f64) -> Self {
        Self::new(GroupBy::from(kind), kind.bonus_policy(salary_percent))
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn bonus_policy(&self) -> BonusPolicy {
        self.bonus_policy
    }

    /// Bonus table this aggregator reads, if its policy uses one
    pub fn bonus_scope(&self) -> Option<BonusScope> {
        match self.bonus_policy {
            BonusPolicy::PerBmmRate => self.group_by.bonus_scope(),
            BonusPolicy::SalaryPercent(_) => None,
        }
    }

    /// Per-group bonus rate for the filtered year; the last row wins
    fn bonus_rates(&self, input: &AggregationInput<'_>) -> HashMap<GroupKey, f64> {
        let Some(scope) = self.bonus_scope() else {
            return HashMap::new();
        };

        let mut rates = HashMap::new();
        for rate in input
            .bonus_rates
            .iter()
            .filter(|r| r.year == input.filter.year && r.scope == scope)
        {
            let key = match scope {
                BonusScope::Company => self.group_by.key(Some(&rate.entity_id), None, None),
                BonusScope::Division => self.group_by.key(None, Some(&rate.entity_id), None),
            };
            if let Some(key) = key {
                rates.insert(key, finite(rate.bn_bmm));
            }
        }
        rates
    }

    /// Produce summaries sorted by month, then case-insensitive code
    pub fn aggregate(&self, input: &AggregationInput<'_>) -> Vec<PeriodSummary> {
        let filter = input.filter;
        let pools = PeriodPools::build(input);
        let overhead_rates = pools.overhead_rates();
        let bonus_rates = self.bonus_rates(input);
        let track_bonus = matches!(self.bonus_policy, BonusPolicy::PerBmmRate);

        let mut salary_by_group: HashMap<(Period, GroupKey), f64> = HashMap::new();
        for s in input.salaries.iter().filter(|s| filter.matches(s.year, s.month)) {
            if let Some(key) = self.group_by.salary_key(s) {
                *salary_by_group
                    .entry((period_of(s.year, s.month), key))
                    .or_default() += finite(s.amount);
            }
        }

        let mut summary_map: BTreeMap<(Period, GroupKey), SummaryAccumulator> = BTreeMap::new();
        let mut skipped = 0usize;

        for r in input.revenues.iter().filter(|r| filter.matches(r.year, r.month)) {
            let Some(key) = self.group_by.revenue_key(r) else {
                skipped += 1;
                continue;
            };
            let period = period_of(r.year, r.month);
            let overhead_rate = overhead_rates.get(&period).copied().unwrap_or(0.0);
            let bonus_rate = bonus_rates.get(&key).copied().unwrap_or(0.0);

            summary_map
                .entry((period, key))
                .or_insert_with_key(|slot| {
                    let salary = salary_by_group.get(slot).copied().unwrap_or(0.0);
                    SummaryAccumulator::new(salary, track_bonus)
                })
                .add_revenue(finite(r.quantity), finite(r.vnd_revenue), overhead_rate, bonus_rate);
        }

        if skipped > 0 {
            debug!(
                "{skipped} revenue rows have no {:?} key and were left out of grouping",
                self.group_by
            );
        }

        let mut summaries: Vec<PeriodSummary> = summary_map
            .into_iter()
            .map(|((period, group), acc)| {
                let (code, name) = self.group_by.label(&group, input.master);
                acc.into_summary(period, group, code, name)
            })
            .collect();

        sort_summaries(&mut summaries);
        debug!("Aggregated {} summaries", summaries.len());
        summaries
    }
}

/// Sort by period, then case-insensitive code
///
/// Ties fall back to the raw code and then the group key so the order is
/// total and independent of input order.
pub fn sort_summaries(summaries: &mut [PeriodSummary]) {
    summaries.sort_by(|a, b| {
        a.period
            .cmp(&b.period)
            .then_with(|| a.code.to_lowercase().cmp(&b.code.to_lowercase()))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.group.cmp(&b.group))
    });
}

/// Collapse lines into one organization-wide line per period
pub fn rollup_business(lines: &[ReportLine]) -> Vec<PeriodSummary> {
    let mut by_period: BTreeMap<Period, SummaryAccumulator> = BTreeMap::new();

    for line in lines {
        let acc = by_period
            .entry(line.summary.period)
            .or_insert_with(|| SummaryAccumulator::new(0.0, true));
        acc.bmm += line.summary.bmm;
        acc.revenue += line.summary.revenue;
        acc.salary_cost += line.summary.salary_cost;
        acc.overhead_cost += line.summary.overhead_cost;
        if let Some(ref mut bonus) = acc.bonus_value {
            *bonus += line.bonus;
        }
    }

    by_period
        .into_iter()
        .map(|(period, acc)| {
            acc.into_summary(
                period,
                GroupKey::Organization,
                ORGANIZATION_CODE.to_string(),
                String::new(),
            )
        })
        .collect()
}

/// Aggregate and finalize a complete report
///
/// `salary_percent` is the global bonus percent used by the customer
/// report; other reports ignore it.
pub fn build_report(kind: ReportKind, input: &AggregationInput<'_>, salary_percent: f64) -> Report {
    let aggregator = PeriodAggregator::for_report(kind, salary_percent);
    let lines: Vec<ReportLine> = aggregator
        .aggregate(input)
        .into_iter()
        .map(|s| s.finalize(salary_percent))
        .collect();

    let lines = if kind == ReportKind::Business {
        rollup_business(&lines)
            .into_iter()
            .map(|s| s.finalize(salary_percent))
            .collect()
    } else {
        lines
    };

    Report::new(
        kind,
        input.filter.year,
        input.filter.selected_months(),
        lines,
    )
}
