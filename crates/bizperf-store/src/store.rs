//! Data directory discovery and repository implementations
//!
//! The data directory is chosen in this order:
//! 1. an explicit path passed to [`JsonStore::open`]
//! 2. the `BIZPERF_DATA_PATH` environment variable
//! 3. `<platform data dir>/bizperf` (for example `~/.local/share/bizperf`)
//!
//! # Examples
//!
//! ```no_run
//! use bizperf_core::filters::PeriodFilter;
//! use bizperf_core::repository::RevenueRepository;
//! use bizperf_store::JsonStore;
//!
//! # async fn example() -> bizperf_core::Result<()> {
//! let store = JsonStore::open(None).await?;
//! let filter = PeriodFilter::new(2024).with_months([1, 2, 3])?;
//! let revenues = store.list(&filter).await?;
//! println!("{} revenue rows in Q1", revenues.len());
//! # Ok(())
//! # }
//! ```

use crate::table::{JsonTable, MasterTable};
use async_trait::async_trait;
use bizperf_core::error::{BizperfError, Result};
use bizperf_core::filters::PeriodFilter;
use bizperf_core::repository::{
    BonusRateRepository, MasterDataRepository, OverheadCostRepository, RevenueRepository,
    SalaryCostRepository,
};
use bizperf_core::types::{
    BonusRateRecord, BonusScope, MasterData, OverheadCostRecord, RecordId, RevenueRecord,
    SalaryCostRecord,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the data directory
pub const DATA_PATH_ENV: &str = "BIZPERF_DATA_PATH";

/// All tables of one data directory
pub struct JsonStore {
    data_dir: PathBuf,
    revenues: JsonTable<RevenueRecord>,
    salary_costs: JsonTable<SalaryCostRecord>,
    costs: JsonTable<OverheadCostRecord>,
    bonus_rates: JsonTable<BonusRateRecord>,
    companies: MasterTable,
    divisions: MasterTable,
    customers: MasterTable,
}

impl JsonStore {
    /// Open the store, creating the data directory if needed
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::discover_data_dir()?,
        };
        tokio::fs::create_dir_all(&data_dir).await?;
        info!("Using data directory {}", data_dir.display());
        Ok(Self::at(data_dir))
    }

    /// Build a store over `data_dir` without touching the filesystem
    pub fn at(data_dir: PathBuf) -> Self {
        Self {
            revenues: JsonTable::new(&data_dir, "revenues"),
            salary_costs: JsonTable::new(&data_dir, "salary_costs"),
            costs: JsonTable::new(&data_dir, "costs"),
            bonus_rates: JsonTable::new(&data_dir, "bonus_rates"),
            companies: JsonTable::new(&data_dir, "companies"),
            divisions: JsonTable::new(&data_dir, "divisions"),
            customers: JsonTable::new(&data_dir, "customers"),
            data_dir,
        }
    }

    /// Resolve the data directory from the environment or platform defaults
    pub fn discover_data_dir() -> Result<PathBuf> {
        if let Ok(custom_path) = std::env::var(DATA_PATH_ENV)
            && !custom_path.trim().is_empty()
        {
            debug!("Data directory from {DATA_PATH_ENV}: {custom_path}");
            return Ok(PathBuf::from(custom_path));
        }

        if let Some(data_dir) = dirs::data_dir() {
            return Ok(data_dir.join("bizperf"));
        }

        if let Some(home) = dirs::home_dir() {
            return Ok(home.join(".bizperf"));
        }

        Err(BizperfError::Config(format!(
            "Could not determine a data directory, set {DATA_PATH_ENV}"
        )))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Replace all master data at once
    pub async fn save_master_data(&self, master: &MasterData) -> Result<()> {
        self.companies.replace_all(&master.companies).await?;
        self.divisions.replace_all(&master.divisions).await?;
        self.customers.replace_all(&master.customers).await?;
        Ok(())
    }
}

#[async_trait]
impl RevenueRepository for JsonStore {
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<RevenueRecord>> {
        let mut rows = self.revenues.read_all().await?;
        rows.retain(|r| filter.matches(r.year, r.month));
        Ok(rows)
    }

    async fn create(&self, record: RevenueRecord) -> Result<RevenueRecord> {
        let mut created = self.create_many(vec![record]).await?;
        created
            .pop()
            .ok_or_else(|| BizperfError::Config("revenue insert returned no row".to_string()))
    }

    async fn create_many(&self, records: Vec<RevenueRecord>) -> Result<Vec<RevenueRecord>> {
        self.revenues
            .insert_many(records, |r, id| r.id = id)
            .await
    }

    async fn update(&self, record: RevenueRecord) -> Result<RevenueRecord> {
        self.revenues.update(record).await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.revenues.delete(id).await
    }
}

#[async_trait]
impl SalaryCostRepository for JsonStore {
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<SalaryCostRecord>> {
        let mut rows = self.salary_costs.read_all().await?;
        rows.retain(|r| filter.matches(r.year, r.month));
        Ok(rows)
    }

    async fn create(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord> {
        let mut created = self
            .salary_costs
            .insert_many(vec![record], |r, id| r.id = id)
            .await?;
        created
            .pop()
            .ok_or_else(|| BizperfError::Config("salary insert returned no row".to_string()))
    }

    async fn update(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord> {
        self.salary_costs.update(record).await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.salary_costs.delete(id).await
    }
}

#[async_trait]
impl OverheadCostRepository for JsonStore {
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<OverheadCostRecord>> {
        let mut rows = self.costs.read_all().await?;
        rows.retain(|r| filter.matches(r.year, r.month));
        Ok(rows)
    }

    async fn create(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord> {
        let mut created = self
            .costs
            .insert_many(vec![record], |r, id| r.id = id)
            .await?;
        created
            .pop()
            .ok_or_else(|| BizperfError::Config("cost insert returned no row".to_string()))
    }

    async fn update(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord> {
        self.costs.update(record).await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.costs.delete(id).await
    }
}

#[async_trait]
impl BonusRateRepository for JsonStore {
    async fn list(&self, year: i32, scope: BonusScope) -> Result<Vec<BonusRateRecord>> {
        let mut rows = self.bonus_rates.read_all().await?;
        rows.retain(|r| r.year == year && r.scope == scope);
        Ok(rows)
    }

    async fn upsert(&self, mut record: BonusRateRecord) -> Result<BonusRateRecord> {
        self.bonus_rates
            .modify(|rows| {
                match rows.iter_mut().find(|r| {
                    r.year == record.year
                        && r.scope == record.scope
                        && r.entity_id == record.entity_id
                }) {
                    Some(existing) => {
                        record.id = existing.id;
                        *existing = record.clone();
                    }
                    None => {
                        record.id = RecordId::new();
                        rows.push(record.clone());
                    }
                }
                Ok(record)
            })
            .await
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.bonus_rates.delete(id).await
    }
}

#[async_trait]
impl MasterDataRepository for JsonStore {
    async fn load(&self) -> Result<MasterData> {
        let (companies, divisions, customers) = tokio::try_join!(
            self.companies.read_all(),
            self.divisions.read_all(),
            self.customers.read_all(),
        )?;
        Ok(MasterData {
            companies,
            divisions,
            customers,
        })
    }
}
