//! Common test utilities and helpers for bizperf tests
//!
//! This module provides builders for table rows, a small master-data set,
//! and a helper that opens a JSON store in a temporary directory.

#![allow(dead_code)]

use bizperf::types::{
    BonusRateRecord, BonusScope, MasterData, MasterEntry, OverheadCostRecord, RecordId,
    RevenueRecord, SalaryCostRecord,
};
use bizperf_store::JsonStore;
use std::sync::Arc;
use tempfile::TempDir;

/// Year used by every builder unless overridden
pub const TEST_YEAR: i32 = 2024;

/// Builder for creating test RevenueRecord instances
pub struct RevenueBuilder {
    record: RevenueRecord,
}

impl RevenueBuilder {
    /// Create a new builder for month 1 with no keys and no figures
    pub fn new() -> Self {
        Self {
            record: RevenueRecord {
                id: RecordId::new(),
                year: TEST_YEAR,
                month: 1,
                company_id: None,
                division_id: None,
                customer_id: None,
                project_name: None,
                quantity: 0.0,
                vnd_revenue: 0.0,
                note: None,
            },
        }
    }

    pub fn year(mut self, year: i32) -> Self {
        self.record.year = year;
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.record.month = month;
        self
    }

    pub fn company(mut self, id: &str) -> Self {
        self.record.company_id = Some(id.to_string());
        self
    }

    pub fn division(mut self, id: &str) -> Self {
        self.record.division_id = Some(id.to_string());
        self
    }

    pub fn customer(mut self, id: &str) -> Self {
        self.record.customer_id = Some(id.to_string());
        self
    }

    pub fn bmm(mut self, quantity: f64) -> Self {
        self.record.quantity = quantity;
        self
    }

    pub fn revenue(mut self, vnd: f64) -> Self {
        self.record.vnd_revenue = vnd;
        self
    }

    pub fn build(self) -> RevenueRecord {
        self.record
    }
}

impl Default for RevenueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Salary row for a company in a month of the test year
pub fn salary(month: u32, company: Option<&str>, amount: f64) -> SalaryCostRecord {
    SalaryCostRecord {
        id: RecordId::new(),
        year: TEST_YEAR,
        month,
        company_id: company.map(str::to_string),
        division_id: None,
        customer_id: None,
        amount,
    }
}

/// Salary row for a division in a month of the test year
pub fn division_salary(month: u32, division: &str, amount: f64) -> SalaryCostRecord {
    SalaryCostRecord {
        division_id: Some(division.to_string()),
        ..salary(month, None, amount)
    }
}

/// Overhead row in a month of the test year
pub fn cost(month: u32, amount: f64, is_cost: bool) -> OverheadCostRecord {
    OverheadCostRecord {
        id: RecordId::new(),
        year: TEST_YEAR,
        month,
        description: Some("office".to_string()),
        cost: amount,
        is_cost,
    }
}

/// Per-BMM bonus rate for the test year
pub fn bonus_rate(scope: BonusScope, entity: &str, bn_bmm: f64) -> BonusRateRecord {
    BonusRateRecord {
        id: RecordId::new(),
        year: TEST_YEAR,
        scope,
        entity_id: entity.to_string(),
        bn_bmm,
    }
}

fn entry(id: &str, code: &str, name: &str, company_id: Option<&str>) -> MasterEntry {
    MasterEntry {
        id: id.to_string(),
        code: code.to_string(),
        name: name.to_string(),
        company_id: company_id.map(str::to_string),
    }
}

/// Two companies, two divisions, two customers
pub fn master_data() -> MasterData {
    MasterData {
        companies: vec![
            entry("A", "ACME", "Acme Corp", None),
            entry("B", "beta", "Beta Ltd", None),
        ],
        divisions: vec![
            entry("D1", "DEV", "Development", Some("A")),
            entry("D2", "OPS", "Operations", Some("B")),
        ],
        customers: vec![
            entry("X", "GLOBEX", "Globex", Some("A")),
            entry("Y", "initech", "Initech", Some("B")),
        ],
    }
}

/// A fresh store in a temporary directory, seeded with [`master_data`]
///
/// Keep the `TempDir` alive for as long as the store is used.
pub async fn temp_store() -> (TempDir, Arc<JsonStore>) {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::open(Some(temp_dir.path().to_path_buf()))
        .await
        .unwrap();
    store.save_master_data(&master_data()).await.unwrap();
    (temp_dir, Arc::new(store))
}
