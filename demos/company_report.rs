//! Company report example for the bizperf library
//!
//! Seeds a throwaway data directory with one quarter of rows and prints
//! the company report as a table.

use bizperf::{
    Result,
    aggregation_types::ReportKind,
    filters::PeriodFilter,
    loader::{ReportLoader, ReportRequest, Repositories},
    output::get_formatter,
    repository::{OverheadCostRepository, RevenueRepository, SalaryCostRepository},
    types::{MasterData, MasterEntry, OverheadCostRecord, RecordId, RevenueRecord, SalaryCostRecord},
};
use bizperf_store::JsonStore;
use std::sync::Arc;

fn company(id: &str, code: &str, name: &str) -> MasterEntry {
    MasterEntry {
        id: id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        company_id: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let data_dir = tempfile::TempDir::new()?;
    let store = Arc::new(JsonStore::open(Some(data_dir.path().to_path_buf())).await?);

    store
        .save_master_data(&MasterData {
            companies: vec![
                company("c-1", "ACME", "Acme Corp"),
                company("c-2", "GLOBEX", "Globex"),
            ],
            ..Default::default()
        })
        .await?;

    for month in 1..=3 {
        for (company_id, bmm, revenue) in [("c-1", 10.0, 1_000_000.0), ("c-2", 4.0, 350_000.0)] {
            RevenueRepository::create(
                &*store,
                RevenueRecord {
                    id: RecordId::new(),
                    year: 2024,
                    month,
                    company_id: Some(company_id.to_string()),
                    division_id: None,
                    customer_id: None,
                    project_name: None,
                    quantity: bmm,
                    vnd_revenue: revenue,
                    note: None,
                },
            )
            .await?;
            SalaryCostRepository::create(
                &*store,
                SalaryCostRecord {
                    id: RecordId::new(),
                    year: 2024,
                    month,
                    company_id: Some(company_id.to_string()),
                    division_id: None,
                    customer_id: None,
                    amount: revenue * 0.3,
                },
            )
            .await?;
        }
        OverheadCostRepository::create(
            &*store,
            OverheadCostRecord {
                id: RecordId::new(),
                year: 2024,
                month,
                description: Some("Office and payroll".to_string()),
                cost: 600_000.0,
                is_cost: true,
            },
        )
        .await?;
    }

    let loader = ReportLoader::new(Repositories::from_store(store));
    let filter = PeriodFilter::new(2024).with_months([1, 2, 3])?;
    let report = loader
        .refresh(&ReportRequest::new(ReportKind::Company, filter))
        .await?;

    println!("{}", get_formatter(false, true).format_report(&report));
    Ok(())
}
