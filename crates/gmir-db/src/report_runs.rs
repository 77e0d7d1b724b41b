//! Database operations for `report_runs`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, run_date, status, total_articles, filtered_articles, \
                           started_at, completed_at, error_message, created_at";

/// A row from the `report_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_date: NaiveDate,
    pub status: String,
    pub total_articles: i32,
    pub filtered_articles: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates the run for `run_date` in `running` status, or re-arms an existing
/// non-completed run (`started_at = NOW()`, error cleared).
///
/// The `UNIQUE (run_date)` constraint makes this a single create-if-absent
/// statement, so two racing triggers converge on the same row. Returns `None`
/// when the run for that date is already `completed`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn claim_report_run(
    pool: &PgPool,
    run_date: NaiveDate,
) -> Result<Option<ReportRunRow>, DbError> {
    let sql = format!(
        "INSERT INTO report_runs (public_id, run_date, status, started_at) \
         VALUES ($1, $2, 'running', NOW()) \
         ON CONFLICT (run_date) DO UPDATE SET \
             status        = 'running', \
             started_at    = NOW(), \
             completed_at  = NULL, \
             error_message = NULL \
         WHERE report_runs.status <> 'completed' \
         RETURNING {RUN_COLUMNS}"
    );

    let row = sqlx::query_as::<_, ReportRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(run_date)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Writes the article counters for a run. Allowed in any status so partial
/// progress stays visible even if later stages fail.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the run does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn record_report_run_counts(
    pool: &PgPool,
    id: i64,
    total_articles: i32,
    filtered_articles: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_runs \
         SET total_articles = $1, filtered_articles = $2 \
         WHERE id = $3",
    )
    .bind(total_articles)
    .bind(filtered_articles)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Marks a run as `completed` and sets `completed_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidReportRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_report_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_runs \
         SET status = 'completed', completed_at = NOW(), error_message = NULL \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidReportRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` and records `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidReportRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_report_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_runs \
         SET status = 'failed', error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidReportRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches the run for a calendar date, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_report_run_by_date(
    pool: &PgPool,
    run_date: NaiveDate,
) -> Result<Option<ReportRunRow>, DbError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM report_runs WHERE run_date = $1");
    let row = sqlx::query_as::<_, ReportRunRow>(&sql)
        .bind(run_date)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest date first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_report_runs(pool: &PgPool, limit: i64) -> Result<Vec<ReportRunRow>, DbError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM report_runs \
         ORDER BY run_date DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, ReportRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the run with the latest date, or `None` if no run exists yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_report_run(pool: &PgPool) -> Result<Option<ReportRunRow>, DbError> {
    Ok(list_report_runs(pool, 1).await?.into_iter().next())
}
