//! CSV export of finalized reports and of the revenue table
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding. Report figures are written the way the table shows them:
//! whole VND for money, two decimals for BMM, one decimal for profit percent
//! (without the `%` sign), and `-` when revenue is zero. Quoting follows
//! RFC 4180.
//!
//! Revenue rows are written with master-data codes under the import header,
//! so [`crate::import`] reads the file back unchanged.

use crate::aggregation_types::{Report, ReportKind, ReportLine};
use crate::import::IMPORT_HEADER;
use crate::output::{format_bmm, round_vnd};
use bizperf_core::error::{BizperfError, Result};
use bizperf_core::types::{MasterData, MasterKind, RevenueRecord};
use chrono::NaiveDate;
use csv::Writer;
use std::path::{Path, PathBuf};
use tracing::info;

/// UTF-8 byte-order mark written before the header
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column order of every export
pub const EXPORT_HEADER: [&str; 11] = [
    "Month",
    "Code",
    "Name",
    "BMM",
    "Revenue",
    "Salary Cost",
    "Overhead Cost",
    "Bonus",
    "Total Cost",
    "Profit",
    "Profit %",
];

/// `<report>_export_<YYYY-MM-DD>.csv`
///
/// # Examples
/// ```
/// use bizperf::aggregation_types::ReportKind;
/// use bizperf::export::export_filename;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(export_filename(ReportKind::Division, date), "division_export_2024-03-09.csv");
/// ```
pub fn export_filename(kind: ReportKind, date: NaiveDate) -> String {
    format!("{}_export_{}.csv", kind.as_str(), date.format("%Y-%m-%d"))
}

/// `revenue_export_<YYYY-MM-DD>.csv`
pub fn revenue_export_filename(date: NaiveDate) -> String {
    format!("revenue_export_{}.csv", date.format("%Y-%m-%d"))
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| BizperfError::Io(std::io::Error::other(format!("CSV writer error: {e}"))))
}

async fn write_file(dir: &Path, name: String, data: Vec<u8>) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

fn percent_cell(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{p:.1}"),
        None => "-".to_string(),
    }
}

fn line_record(line: &ReportLine) -> [String; 11] {
    let s = &line.summary;
    [
        s.period.to_string(),
        s.code.clone(),
        s.name.clone(),
        format_bmm(s.bmm),
        round_vnd(s.revenue).to_string(),
        round_vnd(s.salary_cost).to_string(),
        round_vnd(s.overhead_cost).to_string(),
        round_vnd(line.bonus).to_string(),
        round_vnd(line.total_cost).to_string(),
        round_vnd(line.profit).to_string(),
        percent_cell(line.profit_percent),
    ]
}

/// Writes reports as CSV
#[derive(Debug, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    /// Encode the report lines, BOM included
    pub fn export(&self, report: &Report) -> Result<Vec<u8>> {
        let mut wtr = Writer::from_writer(BOM.to_vec());

        wtr.write_record(EXPORT_HEADER)?;
        for line in &report.lines {
            wtr.write_record(line_record(line))?;
        }

        finish(wtr)
    }

    /// Write the export into `dir` under the dated filename
    pub async fn write_to_dir(&self, report: &Report, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let data = self.export(report)?;
        let path = write_file(dir, export_filename(report.kind, date), data).await?;
        info!(
            "Exported {} lines to {}",
            report.lines.len(),
            path.display()
        );
        Ok(path)
    }
}

/// Writes revenue rows as CSV keyed by master-data codes
///
/// Ids without a master-data entry are written as-is and will not resolve
/// on import.
pub struct RevenueExporter<'a> {
    master: &'a MasterData,
}

impl<'a> RevenueExporter<'a> {
    pub fn new(master: &'a MasterData) -> Self {
        Self { master }
    }

    fn code(&self, kind: MasterKind, id: Option<&str>) -> String {
        id.map(|id| self.master.code_of(kind, id)).unwrap_or_default()
    }

    fn record(&self, row: &RevenueRecord) -> [String; 9] {
        [
            row.year.to_string(),
            row.month.to_string(),
            self.code(MasterKind::Company, row.company_id.as_deref()),
            self.code(MasterKind::Division, row.division_id.as_deref()),
            self.code(MasterKind::Customer, row.customer_id.as_deref()),
            row.project_name.clone().unwrap_or_default(),
            row.quantity.to_string(),
            row.vnd_revenue.to_string(),
            row.note.clone().unwrap_or_default(),
        ]
    }

    /// Encode the rows under the import header, BOM included
    pub fn export(&self, rows: &[RevenueRecord]) -> Result<Vec<u8>> {
        let mut wtr = Writer::from_writer(BOM.to_vec());

        wtr.write_record(IMPORT_HEADER)?;
        for row in rows {
            wtr.write_record(self.record(row))?;
        }

        finish(wtr)
    }

    /// Write the rows into `dir` as `revenue_export_<date>.csv`
    pub async fn write_to_dir(&self, rows: &[RevenueRecord], dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let data = self.export(rows)?;
        let path = write_file(dir, revenue_export_filename(date), data).await?;
        info!("Exported {} revenue rows to {}", rows.len(), path.display());
        Ok(path)
    }
}
