//! Daily run bookkeeping on top of a [`ReportStore`].
//!
//! Status flow: `pending -> running -> completed`, or `running -> failed`
//! and `failed -> running` on retry. Nothing leaves `completed`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use gmir_core::RunStatus;

use crate::error::StoreError;
use crate::store::{ReportStore, RunClaim};
use crate::types::ReportRun;

/// The calendar date a run belongs to, in the configured fixed offset.
#[must_use]
pub fn run_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Whether a run may move from `from` to `to`.
#[must_use]
pub fn transition_allowed(from: RunStatus, to: RunStatus) -> bool {
    use RunStatus::{Completed, Failed, Pending, Running};
    matches!(
        (from, to),
        (Pending | Running | Failed, Running) | (Running, Completed | Failed)
    )
}

pub struct RunLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: ReportStore> RunLedger<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create or re-arm the run for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the claim.
    pub async fn begin(&self, date: NaiveDate) -> Result<RunClaim, StoreError> {
        let claim = self.store.claim_run(date).await?;
        match &claim {
            RunClaim::Started(run) => {
                tracing::info!(run_date = %date, run_id = run.id, "report run started");
            }
            RunClaim::AlreadyCompleted => {
                tracing::info!(run_date = %date, "report run already completed, skipping");
            }
        }
        Ok(claim)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the counters cannot be written.
    pub async fn record_counts(
        &self,
        run: &ReportRun,
        total: usize,
        filtered: usize,
    ) -> Result<(), StoreError> {
        self.store.record_counts(run.id, total, filtered).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the run is not `running` or the write fails.
    pub async fn complete(&self, run: &ReportRun) -> Result<(), StoreError> {
        self.store.complete_run(run.id).await?;
        tracing::info!(run_date = %run.date, run_id = run.id, "report run completed");
        Ok(())
    }

    /// Mark the run failed, logging instead of propagating if that write
    /// itself fails so the original error reaches the caller.
    pub async fn fail_best_effort(&self, run: &ReportRun, message: &str) {
        if let Err(e) = self.store.fail_run(run.id, message).await {
            tracing::error!(
                run_id = run.id,
                error = %e,
                "failed to mark report run as failed"
            );
        } else {
            tracing::warn!(
                run_date = %run.date,
                run_id = run.id,
                reason = message,
                "report run failed"
            );
        }
    }
}
