//! A single JSON array file holding one table
//!
//! Reads parse the whole file; writes go to a sibling `.tmp` file that is
//! then renamed over the original. A per-table mutex serializes
//! read-modify-write cycles inside one process.

use bizperf_core::error::{BizperfError, Result};
use bizperf_core::types::{
    BonusRateRecord, MasterEntry, OverheadCostRecord, RecordId, RevenueRecord, SalaryCostRecord,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Rows persisted in a [`JsonTable`]
pub trait TableRow: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn id(&self) -> RecordId;
}

impl TableRow for RevenueRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl TableRow for SalaryCostRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl TableRow for OverheadCostRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl TableRow for BonusRateRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Typed access to one table file
pub struct JsonTable<T> {
    name: &'static str,
    path: PathBuf,
    lock: Mutex<()>,
    _row: PhantomData<fn() -> T>,
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Table `name` stored at `<dir>/<name>.json`
    pub fn new(dir: &Path, name: &'static str) -> Self {
        Self {
            name,
            path: dir.join(format!("{name}.json")),
            lock: Mutex::new(()),
            _row: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row; a missing file is an empty table
    pub async fn read_all(&self) -> Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    async fn read_unlocked(&self) -> Result<Vec<T>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("Table {} has no file yet", self.name);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let rows: Vec<T> = serde_json::from_slice(&content).map_err(|e| BizperfError::Parse {
            file: self.path.clone(),
            error: e.to_string(),
        })?;
        debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    async fn write_unlocked(&self, rows: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(rows)?;
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }

    /// Apply `f` to the table contents and persist the result
    pub async fn modify<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_unlocked().await?;
        let result = f(&mut rows)?;
        self.write_unlocked(&rows).await?;
        Ok(result)
    }

    /// Overwrite the table
    pub async fn replace_all(&self, rows: &[T]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(rows).await
    }
}

impl<T: TableRow> JsonTable<T> {
    /// Append rows, each with a freshly assigned id
    pub async fn insert_many(
        &self,
        records: Vec<T>,
        assign_id: impl Fn(&mut T, RecordId),
    ) -> Result<Vec<T>> {
        self.modify(|rows| {
            let mut created = Vec::with_capacity(records.len());
            for mut record in records {
                assign_id(&mut record, RecordId::new());
                rows.push(record.clone());
                created.push(record);
            }
            Ok(created)
        })
        .await
    }

    /// Replace the row sharing `record`'s id
    pub async fn update(&self, record: T) -> Result<T> {
        let name = self.name;
        self.modify(|rows| {
            let id = record.id();
            let slot = rows
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or(BizperfError::NotFound { table: name, id })?;
            *slot = record.clone();
            Ok(record)
        })
        .await
    }

    /// Remove the row with `id`
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        let name = self.name;
        self.modify(|rows| {
            let before = rows.len();
            rows.retain(|r| r.id() != id);
            if rows.len() == before {
                return Err(BizperfError::NotFound { table: name, id });
            }
            Ok(())
        })
        .await
    }
}

/// Master-data tables are keyed by their own string ids, not `RecordId`
pub type MasterTable = JsonTable<MasterEntry>;
