//! Revenue CSV import and master-data loading
//!
//! The file carries human-readable codes rather than ids:
//!
//! ```text
//! Year,Month,Company,Division,Customer,Project,BMM,Revenue,Note
//! 2024,1,ACME,DEV,GLOBEX,Portal,10,"1,000,000",
//! ```
//!
//! Header names and codes are matched case-insensitively. An empty code
//! cell leaves that key unset. Every row is validated before anything is
//! written; a single bad row rejects the whole file with one error per
//! failing line.
//!
//! Master data comes from one JSON file holding all three lookups:
//!
//! ```text
//! {
//!   "companies": [{ "id": "c-1", "code": "ACME", "name": "Acme Corp" }],
//!   "divisions": [{ "id": "d-1", "code": "DEV", "name": "Development", "companyId": "c-1" }],
//!   "customers": [{ "id": "u-1", "code": "GLOBEX", "name": "Globex", "companyId": "c-1" }]
//! }
//! ```

use bizperf_core::error::{BizperfError, Result, RowError};
use bizperf_core::repository::{MasterDataRepository, RevenueRepository};
use bizperf_core::types::{
    MasterData, MasterEntry, MasterKind, RecordId, RevenueRecord, parse_lenient,
};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Columns understood by the importer, in export order
pub const IMPORT_HEADER: [&str; 9] = [
    "Year", "Month", "Company", "Division", "Customer", "Project", "BMM", "Revenue", "Note",
];

const REQUIRED: [&str; 4] = ["Year", "Month", "BMM", "Revenue"];

/// Header name to column index
#[derive(Debug, Default)]
struct Columns {
    index: [Option<usize>; 9],
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let mut columns = Self::default();
        for (pos, name) in header.iter().enumerate() {
            let name = name.trim_start_matches('\u{feff}').trim();
            if let Some(slot) = IMPORT_HEADER
                .iter()
                .position(|known| known.eq_ignore_ascii_case(name))
            {
                columns.index[slot] = Some(pos);
            }
        }

        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| columns.position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BizperfError::InvalidArgument(format!(
                "CSV header is missing column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(columns)
    }

    fn position(&self, name: &str) -> Option<usize> {
        IMPORT_HEADER
            .iter()
            .position(|known| *known == name)
            .and_then(|slot| self.index[slot])
    }

    /// Trimmed cell, `None` when the column is absent or the cell is blank
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.position(name)
            .and_then(|pos| record.get(pos))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Resolve an optional human-readable code to its master-data id
///
/// `None` stays `None`; a code without an entry is [`BizperfError::UnknownCode`].
pub fn resolve_code(master: &MasterData, kind: MasterKind, code: Option<&str>) -> Result<Option<String>> {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(None),
        Some(code) => master
            .by_code(kind, code)
            .map(|entry| Some(entry.id.clone()))
            .ok_or_else(|| BizperfError::UnknownCode {
                kind: kind.as_str(),
                code: code.to_string(),
            }),
    }
}

/// Turns CSV rows into revenue records using master-data codes
pub struct RevenueImporter<'a> {
    master: &'a MasterData,
}

impl<'a> RevenueImporter<'a> {
    pub fn new(master: &'a MasterData) -> Self {
        Self { master }
    }

    fn resolve(&self, kind: MasterKind, code: Option<&str>) -> std::result::Result<Option<String>, String> {
        resolve_code(self.master, kind, code).map_err(|e| e.to_string())
    }

    fn parse_row(&self, columns: &Columns, record: &StringRecord) -> std::result::Result<RevenueRecord, String> {
        let year_text = columns.get(record, "Year").ok_or("year is empty")?;
        let year = year_text
            .parse::<i32>()
            .map_err(|_| format!("invalid year '{year_text}'"))?;

        let month_text = columns.get(record, "Month").ok_or("month is empty")?;
        let month = month_text
            .parse::<u32>()
            .map_err(|_| format!("invalid month '{month_text}'"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range: {month}"));
        }

        Ok(RevenueRecord {
            id: RecordId::new(),
            year,
            month,
            company_id: self.resolve(MasterKind::Company, columns.get(record, "Company"))?,
            division_id: self.resolve(MasterKind::Division, columns.get(record, "Division"))?,
            customer_id: self.resolve(MasterKind::Customer, columns.get(record, "Customer"))?,
            project_name: columns.get(record, "Project").map(str::to_string),
            quantity: columns.get(record, "BMM").map(parse_lenient).unwrap_or(0.0),
            vnd_revenue: columns.get(record, "Revenue").map(parse_lenient).unwrap_or(0.0),
            note: columns.get(record, "Note").map(str::to_string),
        })
    }

    /// Parse and validate a whole file
    ///
    /// Returns every record, or [`BizperfError::Import`] listing each bad line.
    pub fn parse(&self, data: &[u8]) -> Result<Vec<RevenueRecord>> {
        let data = data.strip_prefix(crate::export::BOM).unwrap_or(data);
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let columns = Columns::from_header(reader.headers()?)?;
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for result in reader.records() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(records.len() + errors.len() + 2);

            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            match self.parse_row(&columns, &record) {
                Ok(revenue) => records.push(revenue),
                Err(message) => {
                    warn!("Rejected import line {line}: {message}");
                    errors.push(RowError { line, message });
                }
            }
        }

        if errors.is_empty() {
            Ok(records)
        } else {
            Err(BizperfError::Import { errors })
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Import a revenue CSV file, all rows or none
///
/// Returns the number of rows created.
pub async fn import_revenues(
    revenues: &dyn RevenueRepository,
    master: &dyn MasterDataRepository,
    path: &Path,
    show_progress: bool,
) -> Result<usize> {
    let pb = show_progress.then(|| spinner(format!("Importing {}", path.display())));

    let (data, master_data) = futures::try_join!(
        async { tokio::fs::read(path).await.map_err(BizperfError::from) },
        master.load(),
    )?;

    let parsed = RevenueImporter::new(&master_data).parse(&data);
    let records = match parsed {
        Ok(records) => records,
        Err(e) => {
            if let Some(pb) = pb {
                pb.abandon_with_message("Import rejected");
            }
            return Err(e);
        }
    };

    let created = revenues.create_many(records).await?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("Imported {} rows", created.len()));
    }
    info!("Imported {} revenue rows from {}", created.len(), path.display());
    Ok(created.len())
}

fn check_entries(kind: MasterKind, entries: &[MasterEntry], problems: &mut Vec<String>) {
    let mut ids = HashSet::new();
    let mut codes = HashSet::new();
    for (pos, entry) in entries.iter().enumerate() {
        let label = format!("{} #{}", kind.as_str(), pos + 1);
        if entry.id.trim().is_empty() {
            problems.push(format!("{label}: id is empty"));
        } else if !ids.insert(entry.id.as_str()) {
            problems.push(format!("{label}: duplicate id '{}'", entry.id));
        }
        // Codes resolve case-insensitively, so they must be unique that way too
        if entry.code.trim().is_empty() {
            problems.push(format!("{label}: code is empty"));
        } else if !codes.insert(entry.code.trim().to_lowercase()) {
            problems.push(format!("{label}: duplicate code '{}'", entry.code));
        }
    }
}

/// Parse and validate master data from JSON
pub fn parse_master_data(data: &[u8]) -> Result<MasterData> {
    let master: MasterData = serde_json::from_slice(data)?;

    let mut problems = Vec::new();
    check_entries(MasterKind::Company, &master.companies, &mut problems);
    check_entries(MasterKind::Division, &master.divisions, &mut problems);
    check_entries(MasterKind::Customer, &master.customers, &mut problems);

    if problems.is_empty() {
        Ok(master)
    } else {
        Err(BizperfError::InvalidArgument(format!(
            "Invalid master data: {}",
            problems.join("; ")
        )))
    }
}

/// Read a master-data JSON file
pub async fn load_master_file(path: &Path) -> Result<MasterData> {
    let data = tokio::fs::read(path).await?;
    let master = parse_master_data(&data).map_err(|e| match e {
        BizperfError::Json(error) => BizperfError::Parse {
            file: path.to_path_buf(),
            error: error.to_string(),
        },
        other => other,
    })?;
    info!(
        "Loaded {} companies, {} divisions, {} customers from {}",
        master.companies.len(),
        master.divisions.len(),
        master.customers.len(),
        path.display()
    );
    Ok(master)
}
