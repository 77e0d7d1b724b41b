//! Read-only report queries.

use chrono::{DateTime, NaiveDate, Utc};
use gmir_pipeline::{PgReportStore, ReportRun, ReportStore};
use sqlx::PgPool;

/// Print the most recent runs as a table.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_status(pool: PgPool, limit: usize) -> anyhow::Result<()> {
    let store = PgReportStore::new(pool);
    let runs = store.list_runs(limit.max(1)).await?;

    if runs.is_empty() {
        println!("no report runs found; run `gmir-cli run` first");
        return Ok(());
    }

    println!(
        "{:<12}{:<11}{:>7}{:>10}  {:<18}ERROR",
        "DATE", "STATUS", "TOTAL", "FILTERED", "COMPLETED"
    );
    for run in &runs {
        println!("{}", status_row(run));
    }
    Ok(())
}

/// Print one run and its items as pretty JSON.
///
/// # Errors
///
/// Returns an error if no run exists for the date, or the query fails.
pub(crate) async fn run_report_json(pool: PgPool, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let store = PgReportStore::new(pool);
    let run = match date {
        Some(date) => store
            .get_run_by_date(date)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no report run for {date}"))?,
        None => store
            .latest_run()
            .await?
            .ok_or_else(|| anyhow::anyhow!("no report runs yet"))?,
    };
    let items = store.list_items(run.id).await?;

    let body = serde_json::json!({ "run": run, "items": items });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn fmt_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn status_row(run: &ReportRun) -> String {
    let error = run.error_message.as_deref().unwrap_or("");
    format!(
        "{:<12}{:<11}{:>7}{:>10}  {:<18}{}",
        run.date.to_string(),
        run.status.as_str(),
        run.total_articles,
        run.filtered_articles,
        fmt_time(run.completed_at),
        error
    )
}
