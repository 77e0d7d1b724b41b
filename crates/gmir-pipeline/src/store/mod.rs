//! Persistence gateway for run bookkeeping and report items.

mod memory;
mod postgres;

use std::future::Future;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::types::{ReportItem, ReportRun};

pub use memory::MemoryReportStore;
pub use postgres::{load_inputs, PgReportStore};

/// Result of trying to start the run for a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunClaim {
    /// The run is now `running` (freshly created or re-armed).
    Started(ReportRun),
    /// The run for this date is already `completed` and was left untouched.
    AlreadyCompleted,
}

/// Storage operations used by the pipeline and the read endpoints.
///
/// `claim_run` must be a single atomic create-or-reuse keyed by date, so two
/// concurrent triggers for the same date converge on one run.
pub trait ReportStore: Send + Sync {
    fn claim_run(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<RunClaim, StoreError>> + Send;

    fn record_counts(
        &self,
        run_id: i64,
        total: usize,
        filtered: usize,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the run's whole item set atomically. Returns the number of
    /// items written.
    fn replace_items(
        &self,
        run_id: i64,
        items: &[ReportItem],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn complete_run(&self, run_id: i64) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn fail_run(
        &self,
        run_id: i64,
        message: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_run_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<ReportRun>, StoreError>> + Send;

    /// Most recent runs first.
    fn list_runs(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ReportRun>, StoreError>> + Send;

    fn latest_run(&self) -> impl Future<Output = Result<Option<ReportRun>, StoreError>> + Send;

    /// Items ordered by region, then insertion order.
    fn list_items(
        &self,
        run_id: i64,
    ) -> impl Future<Output = Result<Vec<ReportItem>, StoreError>> + Send;
}
