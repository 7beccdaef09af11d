//! CSV export example for the bizperf library
//!
//! Aggregates rows held in memory and writes the customer report as CSV
//! into the current directory.

use bizperf::{
    Result,
    aggregation::{AggregationInput, build_report},
    aggregation_types::ReportKind,
    export::CsvExporter,
    filters::PeriodFilter,
    types::{MasterData, RecordId, RevenueRecord, SalaryCostRecord},
};

fn revenue(customer: &str, bmm: f64, vnd: f64) -> RevenueRecord {
    RevenueRecord {
        id: RecordId::new(),
        year: 2024,
        month: 6,
        company_id: Some("ACME".to_string()),
        division_id: None,
        customer_id: Some(customer.to_string()),
        project_name: None,
        quantity: bmm,
        vnd_revenue: vnd,
        note: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let revenues = vec![
        revenue("INITECH", 3.0, 240_000_000.0),
        revenue("HOOLI", 1.5, 95_000_000.0),
    ];
    let salaries = vec![SalaryCostRecord {
        id: RecordId::new(),
        year: 2024,
        month: 6,
        company_id: Some("ACME".to_string()),
        division_id: None,
        customer_id: Some("INITECH".to_string()),
        amount: 120_000_000.0,
    }];

    let filter = PeriodFilter::new(2024).with_months([6])?;
    let master = MasterData::default();
    let input = AggregationInput {
        filter: &filter,
        revenues: &revenues,
        salaries: &salaries,
        costs: &[],
        bonus_rates: &[],
        master: &master,
    };

    // 10% of salary as bonus
    let report = build_report(ReportKind::Customer, &input, 10.0);

    let today = chrono::Local::now().date_naive();
    let path = CsvExporter::new()
        .write_to_dir(&report, std::path::Path::new("."), today)
        .await?;
    println!("Wrote {} lines to {}", report.lines.len(), path.display());
    Ok(())
}
