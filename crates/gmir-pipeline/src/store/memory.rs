use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use gmir_core::RunStatus;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ReportStore, RunClaim};
use crate::error::StoreError;
use crate::ledger::transition_allowed;
use crate::types::{ReportItem, ReportRun};

/// In-process store: runs live in an arena indexed by date. Used for dry
/// runs and tests.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    runs: Vec<ReportRun>,
    by_date: HashMap<NaiveDate, usize>,
    items: HashMap<i64, Vec<ReportItem>>,
    item_writes: usize,
}

impl MemoryState {
    fn run_mut(&mut self, run_id: i64) -> Result<&mut ReportRun, StoreError> {
        let idx = usize::try_from(run_id - 1).map_err(|_| StoreError::RunNotFound(run_id))?;
        self.runs
            .get_mut(idx)
            .ok_or(StoreError::RunNotFound(run_id))
    }

    fn transition(&mut self, run_id: i64, to: RunStatus) -> Result<&mut ReportRun, StoreError> {
        let run = self.run_mut(run_id)?;
        if !transition_allowed(run.status, to) {
            return Err(StoreError::InvalidTransition {
                id: run_id,
                from: run.status,
                to,
            });
        }
        run.status = to;
        Ok(run)
    }
}

impl MemoryReportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `replace_items` calls that reached the store.
    pub async fn item_write_count(&self) -> usize {
        self.state.lock().await.item_writes
    }
}

impl ReportStore for MemoryReportStore {
    async fn claim_run(&self, date: NaiveDate) -> Result<RunClaim, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let existing = state.by_date.get(&date).copied();
        if let Some(idx) = existing {
            let run = &mut state.runs[idx];
            if run.status == RunStatus::Completed {
                return Ok(RunClaim::AlreadyCompleted);
            }
            run.status = RunStatus::Running;
            run.started_at = Some(now);
            run.completed_at = None;
            run.error_message = None;
            return Ok(RunClaim::Started(run.clone()));
        }

        let id = i64::try_from(state.runs.len() + 1).unwrap_or(i64::MAX);
        let run = ReportRun {
            id,
            public_id: Uuid::new_v4(),
            date,
            status: RunStatus::Running,
            total_articles: 0,
            filtered_articles: 0,
            started_at: Some(now),
            completed_at: None,
            error_message: None,
            created_at: now,
        };
        let idx = state.runs.len();
        state.runs.push(run.clone());
        state.by_date.insert(date, idx);
        Ok(RunClaim::Started(run))
    }

    async fn record_counts(
        &self,
        run_id: i64,
        total: usize,
        filtered: usize,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let run = state.run_mut(run_id)?;
        run.total_articles = total;
        run.filtered_articles = filtered;
        Ok(())
    }

    async fn replace_items(&self, run_id: i64, items: &[ReportItem]) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        state.run_mut(run_id)?;

        let mut sorted = items.to_vec();
        // Stable sort keeps insertion order within a region.
        sorted.sort_by(|a, b| a.region.as_str().cmp(b.region.as_str()));
        state.items.insert(run_id, sorted);
        state.item_writes += 1;
        Ok(items.len())
    }

    async fn complete_run(&self, run_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let run = state.transition(run_id, RunStatus::Completed)?;
        run.completed_at = Some(Utc::now());
        run.error_message = None;
        Ok(())
    }

    async fn fail_run(&self, run_id: i64, message: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let run = state.transition(run_id, RunStatus::Failed)?;
        run.error_message = Some(message.to_string());
        Ok(())
    }

    async fn get_run_by_date(&self, date: NaiveDate) -> Result<Option<ReportRun>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.by_date.get(&date).map(|&idx| state.runs[idx].clone()))
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<ReportRun>, StoreError> {
        let state = self.state.lock().await;
        let mut runs = state.runs.clone();
        runs.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn latest_run(&self) -> Result<Option<ReportRun>, StoreError> {
        Ok(self.list_runs(1).await?.into_iter().next())
    }

    async fn list_items(&self, run_id: i64) -> Result<Vec<ReportItem>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.get(&run_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmir_core::Region;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn item(region: Region, title: &str) -> ReportItem {
        ReportItem {
            region,
            title_en: title.to_string(),
            title_ko: String::new(),
            summary_en: vec![],
            summary_ko: vec![],
            impact_en: String::new(),
            impact_ko: String::new(),
            tags: vec![],
            confidence: 0.5,
            relevance_score: 0.5,
            source_url: String::new(),
            source_name: String::new(),
            published_at: Utc::now(),
        }
    }

    fn started(claim: RunClaim) -> ReportRun {
        match claim {
            RunClaim::Started(run) => run,
            RunClaim::AlreadyCompleted => panic!("expected a started run"),
        }
    }

    #[tokio::test]
    async fn claim_is_one_run_per_date() {
        let store = MemoryReportStore::new();
        let first = started(store.claim_run(day(1)).await.unwrap());
        store.fail_run(first.id, "boom").await.unwrap();

        let second = started(store.claim_run(day(1)).await.unwrap());
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, RunStatus::Running);
        assert!(second.error_message.is_none());
        assert_eq!(store.list_runs(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn completed_run_is_not_reclaimed() {
        let store = MemoryReportStore::new();
        let run = started(store.claim_run(day(2)).await.unwrap());
        store.complete_run(run.id).await.unwrap();

        assert_eq!(
            store.claim_run(day(2)).await.unwrap(),
            RunClaim::AlreadyCompleted
        );
        let err = store.fail_run(run.id, "late").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn replace_items_overwrites_and_orders_by_region() {
        let store = MemoryReportStore::new();
        let run = started(store.claim_run(day(3)).await.unwrap());

        store
            .replace_items(run.id, &[item(Region::Na, "a"), item(Region::Eu, "b")])
            .await
            .unwrap();
        store
            .replace_items(
                run.id,
                &[
                    item(Region::Na, "c"),
                    item(Region::Kr, "d"),
                    item(Region::Na, "e"),
                ],
            )
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_items(run.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title_en)
            .collect();
        assert_eq!(titles, vec!["d", "c", "e"]);
        assert_eq!(store.item_write_count().await, 2);
    }

    #[tokio::test]
    async fn list_runs_newest_first() {
        let store = MemoryReportStore::new();
        for d in [5, 7, 6] {
            store.claim_run(day(d)).await.unwrap();
        }
        let dates: Vec<NaiveDate> = store
            .list_runs(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![day(7), day(6)]);
        assert_eq!(store.latest_run().await.unwrap().unwrap().date, day(7));
    }

    #[tokio::test]
    async fn unknown_run_is_reported() {
        let store = MemoryReportStore::new();
        assert!(matches!(
            store.record_counts(42, 1, 1).await,
            Err(StoreError::RunNotFound(42))
        ));
        assert!(matches!(
            store.complete_run(0).await,
            Err(StoreError::RunNotFound(0))
        ));
    }
}
