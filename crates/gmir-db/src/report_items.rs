//! Database operations for `report_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `report_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportItemRow {
    pub id: i64,
    pub report_run_id: i64,
    pub region: String,
    pub title_en: String,
    pub title_ko: String,
    pub summary_en: Vec<String>,
    pub summary_ko: Vec<String>,
    pub impact_en: String,
    pub impact_ko: String,
    pub tags: Vec<String>,
    pub confidence: Decimal,
    pub relevance_score: Decimal,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

/// Insert payload for one sanitized report item.
#[derive(Debug, Clone)]
pub struct NewReportItem {
    pub region: String,
    pub title_en: String,
    pub title_ko: String,
    pub summary_en: Vec<String>,
    pub summary_ko: Vec<String>,
    pub impact_en: String,
    pub impact_ko: String,
    pub tags: Vec<String>,
    /// Bound to `NUMERIC(4,3)`; must already be within `[0, 1]`.
    pub confidence: Decimal,
    pub relevance_score: Decimal,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

/// Replaces the whole item set of a run inside one transaction.
///
/// Deletes every existing item for `run_id`, then inserts `items`. Either both
/// steps commit or neither does, so a retry never leaves duplicate rows.
/// Returns the number of inserted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn replace_report_items(
    pool: &PgPool,
    run_id: i64,
    items: &[NewReportItem],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM report_items WHERE report_run_id = $1")
        .bind(run_id)
        .execute(&mut *tx)
        .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO report_items \
                 (report_run_id, region, title_en, title_ko, summary_en, summary_ko, \
                  impact_en, impact_ko, tags, confidence, relevance_score, \
                  source_url, source_name, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(run_id)
        .bind(&item.region)
        .bind(&item.title_en)
        .bind(&item.title_ko)
        .bind(&item.summary_en)
        .bind(&item.summary_ko)
        .bind(&item.impact_en)
        .bind(&item.impact_ko)
        .bind(&item.tags)
        .bind(item.confidence)
        .bind(item.relevance_score)
        .bind(&item.source_url)
        .bind(&item.source_name)
        .bind(item.published_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(items.len())
}

/// Returns all items of a run ordered by region, then insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_report_items(pool: &PgPool, run_id: i64) -> Result<Vec<ReportItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ReportItemRow>(
        "SELECT id, report_run_id, region, title_en, title_ko, summary_en, summary_ko, \
                impact_en, impact_ko, tags, confidence, relevance_score, \
                source_url, source_name, published_at \
         FROM report_items \
         WHERE report_run_id = $1 \
         ORDER BY region ASC, id ASC",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
