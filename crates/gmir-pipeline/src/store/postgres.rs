use chrono::NaiveDate;
use gmir_core::{Region, RunStatus};
use gmir_db::{counter_to_i32, DbError, NewReportItem, ReportItemRow, ReportRunRow};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{ReportStore, RunClaim};
use crate::error::StoreError;
use crate::types::{PipelineInputs, ReportItem, ReportRun};

/// Postgres-backed store over the `report_runs` / `report_items` tables.
#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Read enabled sources, keywords and the AI provider row into one value.
///
/// # Errors
///
/// Returns [`StoreError::Db`] if any configuration query fails.
pub async fn load_inputs(pool: &PgPool) -> Result<PipelineInputs, StoreError> {
    let sources = gmir_db::list_enabled_sources(pool)
        .await?
        .into_iter()
        .map(gmir_db::SourceRow::into_source)
        .collect();
    let keywords: Vec<_> = gmir_db::list_keywords(pool)
        .await?
        .into_iter()
        .filter_map(gmir_db::KeywordRow::into_keyword)
        .collect();
    let ai = gmir_db::get_ai_config(pool)
        .await?
        .map(gmir_db::AiConfigRow::into_config)
        .unwrap_or_default();

    Ok(PipelineInputs::new(sources, &keywords, ai))
}

fn run_from_row(row: ReportRunRow) -> Result<ReportRun, StoreError> {
    let status = row.status.parse::<RunStatus>()?;
    Ok(ReportRun {
        id: row.id,
        public_id: row.public_id,
        date: row.run_date,
        status,
        total_articles: usize::try_from(row.total_articles).unwrap_or(0),
        filtered_articles: usize::try_from(row.filtered_articles).unwrap_or(0),
        started_at: row.started_at,
        completed_at: row.completed_at,
        error_message: row.error_message,
        created_at: row.created_at,
    })
}

fn item_from_row(row: ReportItemRow) -> ReportItem {
    ReportItem {
        region: Region::from_label(&row.region),
        title_en: row.title_en,
        title_ko: row.title_ko,
        summary_en: row.summary_en,
        summary_ko: row.summary_ko,
        impact_en: row.impact_en,
        impact_ko: row.impact_ko,
        tags: row.tags,
        confidence: row.confidence.to_f64().unwrap_or(0.0),
        relevance_score: row.relevance_score.to_f64().unwrap_or(0.0),
        source_url: row.source_url,
        source_name: row.source_name,
        published_at: row.published_at,
    }
}

/// `NUMERIC(4,3)` value for a score already clamped to `[0, 1]`.
fn score_to_decimal(score: f64) -> Decimal {
    Decimal::from_f64(score.clamp(0.0, 1.0))
        .map_or(Decimal::ZERO, |d| d.round_dp(3))
}

fn new_item(item: &ReportItem) -> NewReportItem {
    NewReportItem {
        region: item.region.as_str().to_string(),
        title_en: item.title_en.clone(),
        title_ko: item.title_ko.clone(),
        summary_en: item.summary_en.clone(),
        summary_ko: item.summary_ko.clone(),
        impact_en: item.impact_en.clone(),
        impact_ko: item.impact_ko.clone(),
        tags: item.tags.clone(),
        confidence: score_to_decimal(item.confidence),
        relevance_score: score_to_decimal(item.relevance_score),
        source_url: item.source_url.clone(),
        source_name: item.source_name.clone(),
        published_at: item.published_at,
    }
}

/// A `running`-only transition that matched no row means either the run is
/// gone or it was in another status.
fn map_transition_error(err: DbError, run_id: i64, to: RunStatus) -> StoreError {
    match err {
        DbError::InvalidReportRunTransition { .. } => StoreError::InvalidTransition {
            id: run_id,
            from: RunStatus::Running,
            to,
        },
        other => StoreError::Db(other),
    }
}

impl ReportStore for PgReportStore {
    async fn claim_run(&self, date: NaiveDate) -> Result<RunClaim, StoreError> {
        match gmir_db::claim_report_run(&self.pool, date).await? {
            Some(row) => Ok(RunClaim::Started(run_from_row(row)?)),
            None => Ok(RunClaim::AlreadyCompleted),
        }
    }

    async fn record_counts(
        &self,
        run_id: i64,
        total: usize,
        filtered: usize,
    ) -> Result<(), StoreError> {
        let total = counter_to_i32(total)?;
        let filtered = counter_to_i32(filtered)?;
        gmir_db::record_report_run_counts(&self.pool, run_id, total, filtered)
            .await
            .map_err(|e| match e {
                DbError::NotFound => StoreError::RunNotFound(run_id),
                other => StoreError::Db(other),
            })
    }

    async fn replace_items(&self, run_id: i64, items: &[ReportItem]) -> Result<usize, StoreError> {
        let rows: Vec<NewReportItem> = items.iter().map(new_item).collect();
        Ok(gmir_db::replace_report_items(&self.pool, run_id, &rows).await?)
    }

    async fn complete_run(&self, run_id: i64) -> Result<(), StoreError> {
        gmir_db::complete_report_run(&self.pool, run_id)
            .await
            .map_err(|e| map_transition_error(e, run_id, RunStatus::Completed))
    }

    async fn fail_run(&self, run_id: i64, message: &str) -> Result<(), StoreError> {
        gmir_db::fail_report_run(&self.pool, run_id, message)
            .await
            .map_err(|e| map_transition_error(e, run_id, RunStatus::Failed))
    }

    async fn get_run_by_date(&self, date: NaiveDate) -> Result<Option<ReportRun>, StoreError> {
        gmir_db::get_report_run_by_date(&self.pool, date)
            .await?
            .map(run_from_row)
            .transpose()
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<ReportRun>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        gmir_db::list_report_runs(&self.pool, limit)
            .await?
            .into_iter()
            .map(run_from_row)
            .collect()
    }

    async fn latest_run(&self) -> Result<Option<ReportRun>, StoreError> {
        gmir_db::get_latest_report_run(&self.pool)
            .await?
            .map(run_from_row)
            .transpose()
    }

    async fn list_items(&self, run_id: i64) -> Result<Vec<ReportItem>, StoreError> {
        Ok(gmir_db::list_report_items(&self.pool, run_id)
            .await?
            .into_iter()
            .map(item_from_row)
            .collect())
    }
}
