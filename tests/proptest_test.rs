//! Property-based tests for bizperf using proptest

mod common;

use bizperf::{
    aggregation::{AggregationInput, build_report},
    aggregation_types::ReportKind,
    filters::PeriodFilter,
    types::{MasterData, OverheadCostRecord, RevenueRecord, SalaryCostRecord},
};
use common::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Strategies for generating test data

prop_compose! {
    fn arb_revenue()(
        month in 1u32..=3,
        company in prop::option::weighted(0.9, prop::sample::select(vec!["A", "B", "c", "D"])),
        customer in prop::option::weighted(0.8, prop::sample::select(vec!["X", "Y", "z"])),
        quantity in 0.0f64..50.0,
        revenue in prop::option::weighted(0.8, 0.0f64..10_000_000.0),
    ) -> RevenueRecord {
        // Zero revenue often enough to exercise the missing percent
        let mut builder = RevenueBuilder::new()
            .month(month)
            .bmm(quantity)
            .revenue(revenue.unwrap_or(0.0));
        if let Some(company) = company {
            builder = builder.company(company);
        }
        if let Some(customer) = customer {
            builder = builder.customer(customer);
        }
        builder.build()
    }
}

prop_compose! {
    fn arb_salary()(
        month in 1u32..=3,
        company in prop::sample::select(vec!["A", "B", "c", "D"]),
        amount in 0.0f64..1_000_000.0,
    ) -> SalaryCostRecord {
        salary(month, Some(company), amount)
    }
}

prop_compose! {
    fn arb_cost()(
        month in 1u32..=3,
        amount in 0.0f64..5_000_000.0,
        is_cost in any::<bool>(),
    ) -> OverheadCostRecord {
        cost(month, amount, is_cost)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn test_bmm_conservation(
        revenues in prop::collection::vec(arb_revenue(), 0..40),
        salaries in prop::collection::vec(arb_salary(), 0..10),
        costs in prop::collection::vec(arb_cost(), 0..10),
    ) {
        let filter = PeriodFilter::new(TEST_YEAR);
        let master = MasterData::default();
        let input = AggregationInput {
            filter: &filter,
            revenues: &revenues,
            salaries: &salaries,
            costs: &costs,
            bonus_rates: &[],
            master: &master,
        };
        let report = build_report(ReportKind::Company, &input, 0.0);

        let mut expected: BTreeMap<u32, f64> = BTreeMap::new();
        for r in revenues.iter().filter(|r| r.company_id.is_some()) {
            *expected.entry(r.month).or_default() += r.quantity;
        }
        let mut actual: BTreeMap<u32, f64> = BTreeMap::new();
        for line in &report.lines {
            *actual.entry(line.summary.period.month).or_default() += line.summary.bmm;
        }

        prop_assert_eq!(expected.keys().collect::<Vec<_>>(), actual.keys().collect::<Vec<_>>());
        for (month, bmm) in &expected {
            prop_assert!(close(*bmm, actual[month]));
        }
    }

    #[test]
    fn test_overhead_pool_fully_allocated(
        revenues in prop::collection::vec(arb_revenue(), 1..40),
        salaries in prop::collection::vec(arb_salary(), 0..10),
        costs in prop::collection::vec(arb_cost(), 0..10),
    ) {
        // Every row keyed, so the whole pool lands on report lines
        let revenues: Vec<RevenueRecord> = revenues
            .into_iter()
            .map(|mut r| {
                r.company_id.get_or_insert_with(|| "A".to_string());
                r
            })
            .collect();

        let filter = PeriodFilter::new(TEST_YEAR);
        let master = MasterData::default();
        let input = AggregationInput {
            filter: &filter,
            revenues: &revenues,
            salaries: &salaries,
            costs: &costs,
            bonus_rates: &[],
            master: &master,
        };
        let report = build_report(ReportKind::Company, &input, 0.0);

        for month in 1..=3u32 {
            let bmm: f64 = revenues.iter().filter(|r| r.month == month).map(|r| r.quantity).sum();
            let costs_in_month: Vec<_> = costs.iter().filter(|c| c.month == month && c.is_cost).collect();
            let overhead: f64 = report
                .lines
                .iter()
                .filter(|l| l.summary.period.month == month)
                .map(|l| l.summary.overhead_cost)
                .sum();

            if bmm == 0.0 || costs_in_month.is_empty() {
                prop_assert_eq!(overhead, 0.0);
            } else {
                let pool: f64 = costs_in_month.iter().map(|c| c.cost).sum::<f64>()
                    - salaries.iter().filter(|s| s.month == month).map(|s| s.amount).sum::<f64>();
                prop_assert!(close(overhead, pool));
            }
        }
    }

    #[test]
    fn test_lines_sorted_by_month_then_code(
        revenues in prop::collection::vec(arb_revenue(), 0..40),
    ) {
        let filter = PeriodFilter::new(TEST_YEAR);
        let master = master_data();
        let input = AggregationInput {
            filter: &filter,
            revenues: &revenues,
            salaries: &[],
            costs: &[],
            bonus_rates: &[],
            master: &master,
        };
        let report = build_report(ReportKind::Company, &input, 0.0);

        for pair in report.lines.windows(2) {
            let a = (pair[0].summary.period, pair[0].summary.code.to_lowercase());
            let b = (pair[1].summary.period, pair[1].summary.code.to_lowercase());
            prop_assert!(a <= b);
        }
    }

    #[test]
    fn test_profit_percent_absent_only_for_zero_revenue(
        revenues in prop::collection::vec(arb_revenue(), 0..20),
        percent in 0.0f64..100.0,
    ) {
        let filter = PeriodFilter::new(TEST_YEAR);
        let master = MasterData::default();
        let input = AggregationInput {
            filter: &filter,
            revenues: &revenues,
            salaries: &[],
            costs: &[],
            bonus_rates: &[],
            master: &master,
        };
        let report = build_report(ReportKind::Customer, &input, percent);

        if revenues.iter().any(|r| r.customer_id.is_some()) {
            prop_assert!(!report.lines.is_empty());
        }
        for line in &report.lines {
            prop_assert_eq!(line.profit_percent.is_none(), line.summary.revenue == 0.0);
            prop_assert!(close(line.profit, line.summary.revenue - line.total_cost));
        }
    }
}
