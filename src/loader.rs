//! Report loading: concurrent fetch, aggregate, commit
//!
//! The four row sets and the master data are fetched concurrently and
//! joined before aggregation. Every refresh takes a generation number; a
//! result is committed only if no newer refresh started in the meantime,
//! so a slow, superseded request can never overwrite a fresher report.
//! When a fetch fails the previous report stays in place.
//!
//! # Examples
//!
//! ```no_run
//! use bizperf::aggregation_types::ReportKind;
//! use bizperf::filters::PeriodFilter;
//! use bizperf::loader::{ReportLoader, ReportRequest, Repositories};
//! use bizperf_store::JsonStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> bizperf::Result<()> {
//! let store = Arc::new(JsonStore::open(None).await?);
//! let loader = ReportLoader::new(Repositories::from_store(store));
//!
//! let request = ReportRequest::new(ReportKind::Company, PeriodFilter::new(2024));
//! let report = loader.refresh(&request).await?;
//! println!("{} lines", report.lines.len());
//! # Ok(())
//! # }
//! ```

use crate::aggregation::{AggregationInput, PeriodAggregator, build_report};
use crate::aggregation_types::{Report, ReportKind};
use bizperf_core::error::{BizperfError, Result};
use bizperf_core::filters::PeriodFilter;
use bizperf_core::repository::{
    BonusRateRepository, MasterDataRepository, OverheadCostRepository, RevenueRepository,
    SalaryCostRepository,
};
use bizperf_core::types::{
    BonusRateRecord, MasterData, OverheadCostRecord, RevenueRecord, SalaryCostRecord,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// One handle per table
#[derive(Clone)]
pub struct Repositories {
    pub revenues: Arc<dyn RevenueRepository>,
    pub salaries: Arc<dyn SalaryCostRepository>,
    pub costs: Arc<dyn OverheadCostRepository>,
    pub bonus_rates: Arc<dyn BonusRateRepository>,
    pub master: Arc<dyn MasterDataRepository>,
}

impl Repositories {
    /// Use a single store for every table
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RevenueRepository
            + SalaryCostRepository
            + OverheadCostRepository
            + BonusRateRepository
            + MasterDataRepository
            + 'static,
    {
        Self {
            revenues: store.clone(),
            salaries: store.clone(),
            costs: store.clone(),
            bonus_rates: store.clone(),
            master: store,
        }
    }
}

/// What to load
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub filter: PeriodFilter,
    /// Global bonus percent of salary, used by the customer report
    pub salary_percent: f64,
}

impl ReportRequest {
    pub fn new(kind: ReportKind, filter: PeriodFilter) -> Self {
        Self {
            kind,
            filter,
            salary_percent: 0.0,
        }
    }

    pub fn with_salary_percent(mut self, percent: f64) -> Self {
        self.salary_percent = percent;
        self
    }
}

/// Rows fetched for one request
#[derive(Debug, Clone, Default)]
pub struct FetchedRows {
    pub revenues: Vec<RevenueRecord>,
    pub salaries: Vec<SalaryCostRecord>,
    pub costs: Vec<OverheadCostRecord>,
    pub bonus_rates: Vec<BonusRateRecord>,
    pub master: MasterData,
}

/// Fetches, aggregates, and holds the latest committed report
pub struct ReportLoader {
    repos: Repositories,
    generation: AtomicU64,
    snapshot: RwLock<Option<Arc<Report>>>,
}

impl ReportLoader {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            generation: AtomicU64::new(0),
            snapshot: RwLock::new(None),
        }
    }

    /// The most recently committed report
    pub async fn current(&self) -> Option<Arc<Report>> {
        self.snapshot.read().await.clone()
    }

    /// Fetch every row set the request needs, concurrently
    pub async fn fetch(&self, request: &ReportRequest) -> Result<FetchedRows> {
        let filter = &request.filter;
        let bonus_scope =
            PeriodAggregator::for_report(request.kind, request.salary_percent).bonus_scope();

        let bonus_rates = async {
            match bonus_scope {
                Some(scope) => self.repos.bonus_rates.list(filter.year, scope).await,
                None => Ok(Vec::new()),
            }
        };

        let (revenues, salaries, costs, bonus_rates, master) = futures::try_join!(
            self.repos.revenues.list(filter),
            self.repos.salaries.list(filter),
            self.repos.costs.list_costs(filter),
            bonus_rates,
            self.repos.master.load(),
        )?;

        debug!(
            "Fetched {} revenue, {} salary, {} cost, {} bonus rows",
            revenues.len(),
            salaries.len(),
            costs.len(),
            bonus_rates.len()
        );

        Ok(FetchedRows {
            revenues,
            salaries,
            costs,
            bonus_rates,
            master,
        })
    }

    /// Load, aggregate, and commit a report
    ///
    /// Returns [`BizperfError::Superseded`] when a newer refresh started
    /// before this one finished; the newer one owns the snapshot.
    pub async fn refresh(&self, request: &ReportRequest) -> Result<Arc<Report>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Loading {} report for {} (request #{generation})",
            request.kind, request.filter.year
        );

        let rows = match self.fetch(request).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to load {} report: {e}", request.kind);
                return Err(e);
            }
        };

        let input = AggregationInput {
            filter: &request.filter,
            revenues: &rows.revenues,
            salaries: &rows.salaries,
            costs: &rows.costs,
            bonus_rates: &rows.bonus_rates,
            master: &rows.master,
        };
        let report = Arc::new(build_report(request.kind, &input, request.salary_percent));

        let mut slot = self.snapshot.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding result of request #{generation}, a newer request started");
            return Err(BizperfError::Superseded);
        }
        *slot = Some(report.clone());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bizperf_core::types::{BonusScope, RecordId};
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    /// In-memory tables; requests for `slow_year` sleep before answering
    #[derive(Default)]
    struct FakeStore {
        revenues: Vec<RevenueRecord>,
        slow_year: Option<i32>,
        fail: AtomicBool,
    }

    impl FakeStore {
        async fn maybe_delay(&self, year: i32) -> Result<()> {
            if self.slow_year == Some(year) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(BizperfError::Io(std::io::Error::other("connection reset")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RevenueRepository for FakeStore {
        async fn list(&self, filter: &PeriodFilter) -> Result<Vec<RevenueRecord>> {
            self.maybe_delay(filter.year).await?;
            Ok(self
                .revenues
                .iter()
                .filter(|r| filter.matches(r.year, r.month))
                .cloned()
                .collect())
        }
        async fn create(&self, record: RevenueRecord) -> Result<RevenueRecord> {
            Ok(record)
        }
        async fn update(&self, record: RevenueRecord) -> Result<RevenueRecord> {
            Ok(record)
        }
        async fn delete(&self, _id: RecordId) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl SalaryCostRepository for FakeStore {
        async fn list(&self, _filter: &PeriodFilter) -> Result<Vec<SalaryCostRecord>> {
            Ok(Vec::new())
        }
        async fn create(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord> {
            Ok(record)
        }
        async fn update(&self, record: SalaryCostRecord) -> Result<SalaryCostRecord> {
            Ok(record)
        }
        async fn delete(&self, _id: RecordId) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl OverheadCostRepository for FakeStore {
        async fn list(&self, _filter: &PeriodFilter) -> Result<Vec<OverheadCostRecord>> {
            Ok(Vec::new())
        }
        async fn create(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord> {
            Ok(record)
        }
        async fn update(&self, record: OverheadCostRecord) -> Result<OverheadCostRecord> {
            Ok(record)
        }
        async fn delete(&self, _id: RecordId) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl BonusRateRepository for FakeStore {
        async fn list(&self, _year: i32, _scope: BonusScope) -> Result<Vec<BonusRateRecord>> {
            Ok(Vec::new())
        }
        async fn upsert(&self, record: BonusRateRecord) -> Result<BonusRateRecord> {
            Ok(record)
        }
        async fn delete(&self, _id: RecordId) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl MasterDataRepository for FakeStore {
        async fn load(&self) -> Result<MasterData> {
            Ok(MasterData::default())
        }
    }

    fn revenue(year: i32, quantity: f64) -> RevenueRecord {
        RevenueRecord {
            id: RecordId::new(),
            year,
            month: 1,
            company_id: Some("A".to_string()),
            division_id: None,
            customer_id: None,
            project_name: None,
            quantity,
            vnd_revenue: 1_000.0,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_commits_snapshot() {
        let store = Arc::new(FakeStore {
            revenues: vec![revenue(2024, 3.0)],
            ..Default::default()
        });
        let loader = ReportLoader::new(Repositories::from_store(store));
        assert!(loader.current().await.is_none());

        let request = ReportRequest::new(ReportKind::Company, PeriodFilter::new(2024));
        let report = loader.refresh(&request).await.unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.totals.bmm, 3.0);
        assert_eq!(loader.current().await.unwrap().year, 2024);
    }

    #[tokio::test]
    async fn test_stale_request_does_not_overwrite() {
        let store = Arc::new(FakeStore {
            revenues: vec![revenue(2023, 1.0), revenue(2024, 2.0)],
            slow_year: Some(2023),
            ..Default::default()
        });
        let loader = ReportLoader::new(Repositories::from_store(store));

        let slow = ReportRequest::new(ReportKind::Company, PeriodFilter::new(2023));
        let fast = ReportRequest::new(ReportKind::Company, PeriodFilter::new(2024));
        let (slow_result, fast_result) = tokio::join!(loader.refresh(&slow), loader.refresh(&fast));

        assert!(matches!(slow_result, Err(BizperfError::Superseded)));
        assert_eq!(fast_result.unwrap().year, 2024);
        assert_eq!(loader.current().await.unwrap().year, 2024);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_report() {
        let store = Arc::new(FakeStore {
            revenues: vec![revenue(2024, 2.0)],
            ..Default::default()
        });
        let loader = ReportLoader::new(Repositories::from_store(store.clone()));

        let request = ReportRequest::new(ReportKind::Company, PeriodFilter::new(2024));
        loader.refresh(&request).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let result = loader.refresh(&request).await;
        assert!(matches!(result, Err(BizperfError::Io(_))));

        let current = loader.current().await.unwrap();
        assert_eq!(current.totals.bmm, 2.0);
    }
}
