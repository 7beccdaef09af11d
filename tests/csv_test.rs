//! CSV export and import tests

mod common;

use bizperf::{
    aggregation_types::ReportKind,
    error::BizperfError,
    export::{BOM, CsvExporter, EXPORT_HEADER, RevenueExporter, revenue_export_filename},
    filters::PeriodFilter,
    import::import_revenues,
    loader::{ReportLoader, ReportRequest, Repositories},
    output::{format_percent, round_vnd},
    repository::{
        MasterDataRepository, OverheadCostRepository, RevenueRepository, SalaryCostRepository,
    },
};
use common::*;
use std::io::Write;

#[tokio::test]
async fn test_export_reparse_matches_rounded_figures() {
    let (_dir, store) = temp_store().await;

    RevenueRepository::create_many(
        &*store,
        vec![
            RevenueBuilder::new()
                .company("A")
                .bmm(3.0)
                .revenue(1_234_567.8)
                .build(),
            RevenueBuilder::new()
                .company("B")
                .bmm(7.0)
                .revenue(0.0)
                .build(),
        ],
    )
    .await
    .unwrap();
    SalaryCostRepository::create(&*store, salary(1, Some("A"), 333_333.3))
        .await
        .unwrap();
    OverheadCostRepository::create(&*store, cost(1, 1_000_000.0, true))
        .await
        .unwrap();

    let loader = ReportLoader::new(Repositories::from_store(store));
    let report = loader
        .refresh(&ReportRequest::new(
            ReportKind::Company,
            PeriodFilter::new(TEST_YEAR).with_months([1]).unwrap(),
        ))
        .await
        .unwrap();

    let data = CsvExporter::new().export(&report).unwrap();
    assert!(data.starts_with(BOM));

    let mut reader = csv::Reader::from_reader(&data[BOM.len()..]);
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, EXPORT_HEADER);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), report.lines.len());

    for (row, line) in rows.iter().zip(&report.lines) {
        assert_eq!(&row[1], line.summary.code);
        assert_eq!(row[4].parse::<i64>().unwrap(), round_vnd(line.summary.revenue));
        assert_eq!(row[5].parse::<i64>().unwrap(), round_vnd(line.summary.salary_cost));
        assert_eq!(row[6].parse::<i64>().unwrap(), round_vnd(line.summary.overhead_cost));
        assert_eq!(row[8].parse::<i64>().unwrap(), round_vnd(line.total_cost));
        assert_eq!(row[9].parse::<i64>().unwrap(), round_vnd(line.profit));

        // Same text as on screen, minus the percent sign
        let shown = format_percent(line.profit_percent);
        assert_eq!(&row[10], shown.trim_end_matches('%'));
    }

    assert_eq!(&rows[1][10], "-");
}

fn write_csv(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("revenues.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_import_creates_rows() {
    let (dir, store) = temp_store().await;
    let path = write_csv(
        dir.path(),
        "Year,Month,Company,Division,Customer,Project,BMM,Revenue,Note\n\
         2024,1,ACME,DEV,GLOBEX,Portal,2.5,\"250,000\",\n\
         2024,2,Beta,,,,1,100000,second\n",
    );

    let count = import_revenues(&*store, &*store, &path, false).await.unwrap();
    assert_eq!(count, 2);

    let rows = RevenueRepository::list(&*store, &PeriodFilter::new(TEST_YEAR))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].company_id.as_deref(), Some("A"));
    assert_eq!(rows[0].division_id.as_deref(), Some("D1"));
    assert_eq!(rows[0].customer_id.as_deref(), Some("X"));
    assert_eq!(rows[0].vnd_revenue, 250_000.0);
    assert_eq!(rows[1].company_id.as_deref(), Some("B"));
    assert!(rows[1].division_id.is_none());
}

#[tokio::test]
async fn test_import_is_all_or_nothing() {
    let (dir, store) = temp_store().await;
    let path = write_csv(
        dir.path(),
        "Year,Month,Company,BMM,Revenue\n\
         2024,1,ACME,1,100\n\
         2024,1,UNKNOWN,1,100\n",
    );

    let err = import_revenues(&*store, &*store, &path, false)
        .await
        .unwrap_err();
    match err {
        BizperfError::Import { errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].line, 3);
        }
        other => panic!("Expected import error, got {other:?}"),
    }

    let rows = RevenueRepository::list(&*store, &PeriodFilter::new(TEST_YEAR))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_import_missing_file() {
    let (dir, store) = temp_store().await;
    let err = import_revenues(&*store, &*store, &dir.path().join("nope.csv"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, BizperfError::Io(_)));
}

#[tokio::test]
async fn test_revenue_export_imports_back() {
    let (_dir, source) = temp_store().await;
    let mut noted = RevenueBuilder::new()
        .company("B")
        .customer("Y")
        .month(2)
        .bmm(1.25)
        .revenue(99_999.5)
        .build();
    noted.project_name = Some("Billing, \"v2\"".to_string());
    noted.note = Some("multi\nline".to_string());

    RevenueRepository::create_many(
        &*source,
        vec![
            RevenueBuilder::new()
                .company("A")
                .division("D1")
                .customer("X")
                .bmm(3.0)
                .revenue(3_000_000.0)
                .build(),
            noted,
            RevenueBuilder::new().bmm(0.5).build(),
        ],
    )
    .await
    .unwrap();

    let filter = PeriodFilter::new(TEST_YEAR);
    let exported = RevenueRepository::list(&*source, &filter).await.unwrap();
    let master = source.load().await.unwrap();

    let out_dir = tempfile::TempDir::new().unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let path = RevenueExporter::new(&master)
        .write_to_dir(&exported, out_dir.path(), date)
        .await
        .unwrap();
    assert_eq!(path, out_dir.path().join(revenue_export_filename(date)));

    let (_other_dir, target) = temp_store().await;
    let count = import_revenues(&*target, &*target, &path, false)
        .await
        .unwrap();
    assert_eq!(count, exported.len());

    let imported = RevenueRepository::list(&*target, &filter).await.unwrap();
    for (before, after) in exported.iter().zip(&imported) {
        assert_ne!(before.id, after.id);
        assert_eq!(after.year, before.year);
        assert_eq!(after.month, before.month);
        assert_eq!(after.company_id, before.company_id);
        assert_eq!(after.division_id, before.division_id);
        assert_eq!(after.customer_id, before.customer_id);
        assert_eq!(after.project_name, before.project_name);
        assert_eq!(after.quantity, before.quantity);
        assert_eq!(after.vnd_revenue, before.vnd_revenue);
        assert_eq!(after.note, before.note);
    }
}
