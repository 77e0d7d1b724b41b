//! `run` command: executes the report pipeline once from the terminal.

use chrono::NaiveDate;
use gmir_core::AppConfig;
use gmir_pipeline::{
    MemoryReportStore, PgReportStore, PipelineOutcome, PipelineRunner, ReportStore,
};
use sqlx::PgPool;

/// Run the pipeline for `date` (today when `None`).
///
/// Sources, keywords and AI settings are always read from Postgres. With
/// `dry_run` the run ledger and items live in memory, so the database is
/// left untouched and the generated items are printed instead.
///
/// # Errors
///
/// Returns an error if the runner cannot be built or the run fails.
pub(crate) async fn run_report(
    pool: PgPool,
    config: &AppConfig,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let runner = PipelineRunner::from_app_config(MemoryReportStore::new(), pool, config)?;
        let outcome = execute(&runner, date).await?;
        println!("dry-run: {}", outcome_line(&outcome));
        if let PipelineOutcome::Completed(summary) = &outcome {
            println!("{}", serde_json::to_string_pretty(&summary.items)?);
        }
        return Ok(());
    }

    let runner = PipelineRunner::from_app_config(PgReportStore::new(pool.clone()), pool, config)?;
    let outcome = execute(&runner, date).await?;
    println!("{}", outcome_line(&outcome));
    Ok(())
}

async fn execute<S: ReportStore>(
    runner: &PipelineRunner<S>,
    date: Option<NaiveDate>,
) -> anyhow::Result<PipelineOutcome> {
    let date = date.unwrap_or_else(|| runner.today());
    runner.run_for(date).await.map_err(|e| {
        tracing::error!(run_date = %date, error = %e, "pipeline run failed");
        let public = e.public_message();
        anyhow::Error::new(e).context(public)
    })
}

fn outcome_line(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::AlreadyCompleted { .. } => outcome.message(),
        PipelineOutcome::NoRelevantArticles {
            date,
            total_articles,
        } => format!(
            "{} for {date} ({total_articles} fetched)",
            outcome.message()
        ),
        PipelineOutcome::Completed(summary) => format!(
            "{} for {}: {} fetched, {} relevant, {} items",
            outcome.message(),
            summary.date,
            summary.total_articles,
            summary.filtered_articles,
            summary.items.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use gmir_pipeline::{PipelineOutcome, RunSummary};

    use super::outcome_line;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn outcome_line_reports_counts() {
        let outcome = PipelineOutcome::Completed(RunSummary {
            date: day(),
            total_articles: 12,
            filtered_articles: 4,
            items: vec![],
        });
        assert_eq!(
            outcome_line(&outcome),
            "Pipeline complete for 2026-03-14: 12 fetched, 4 relevant, 0 items"
        );
    }

    #[test]
    fn outcome_line_for_empty_run() {
        let outcome = PipelineOutcome::NoRelevantArticles {
            date: day(),
            total_articles: 7,
        };
        assert_eq!(
            outcome_line(&outcome),
            "No relevant articles found for 2026-03-14 (7 fetched)"
        );
    }

    #[test]
    fn outcome_line_for_completed_date() {
        let outcome = PipelineOutcome::AlreadyCompleted { date: day() };
        assert_eq!(
            outcome_line(&outcome),
            "Report already completed for 2026-03-14"
        );
    }
}
