//! Repository traits for table access
//!
//! One trait per table. Storage backends implement them and the report
//! loader receives them as `Arc<dyn …>`, so tests and alternative stores
//! plug in without touching the aggregation code.

use crate::error::Result;
use crate::filters::PeriodFilter;
use crate::types::{
    BonusRateRecord, BonusScope, MasterData, OverheadCostRecord, RecordId, RevenueRecord,
    SalaryCostRecord,
};
use async_trait::async_trait;

/// Revenue line items
#[async_trait]
pub trait RevenueRepository: Send + Sync {
    /// All rows in the filtered year and months
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<RevenueRecord>>;

    /// Persist a new row; the store assigns its id
    async fn create(&self, record: RevenueRecord) -> Result<RevenueRecord>;

    /// Persist many rows in one write
    async fn create_many(&self, records: Vec<RevenueRecord>) -> Result<Vec<RevenueRecord>> {
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            created.push(self.create(record).await?);
        }
        Ok(created)
    }

    /// Replace the row with the same id
    async fn update(&self, record: RevenueRecord) -> Result<RevenueRecord>;

    /// Remove the row with `id`
    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Salary allocations
#[async_trait]
pub trait SalaryCostRepository: Send + Sync {
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<SalaryCostRecord>>;
    async fn create(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord>;
    async fn update(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord>;
    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Organization-wide cost lines
#[async_trait]
pub trait OverheadCostRepository: Send + Sync {
    /// Every row in the filtered period, cost or not
    async fn list(&self, filter: &PeriodFilter) -> Result<Vec<OverheadCostRecord>>;

    /// Only the rows flagged `is_cost`, the overhead pool input
    async fn list_costs(&self, filter: &PeriodFilter) -> Result<Vec<OverheadCostRecord>> {
        let mut rows = self.list(filter).await?;
        rows.retain(|r| r.is_cost);
        Ok(rows)
    }

    async fn create(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord>;
    async fn update(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord>;
    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Per-BMM bonus rates
#[async_trait]
pub trait BonusRateRepository: Send + Sync {
    /// Rates of one table for a year, in storage order
    async fn list(&self, year: i32, scope: BonusScope) -> Result<Vec<BonusRateRecord>>;

    /// Insert, or replace the existing rate for the same `(year, scope, entity)`
    async fn upsert(&self, record: BonusRateRecord) -> Result<BonusRateRecord>;

    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Company, division, and customer lookups
#[async_trait]
pub trait MasterDataRepository: Send + Sync {
    async fn load(&self) -> Result<MasterData>;
}
