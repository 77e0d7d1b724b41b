//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the daily
//! report pipeline job.

use std::sync::Arc;

use gmir_pipeline::{PgReportStore, PipelineOutcome, PipelineRunner};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: Arc<PipelineRunner<PgReportStore>>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_daily_report_job(&scheduler, runner, cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily report job. The default schedule `0 0 22 * * *` (UTC)
/// fires at 07:00 KST.
async fn register_daily_report_job(
    scheduler: &JobScheduler,
    runner: Arc<PipelineRunner<PgReportStore>>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily report run");
            run_daily_report_job(&runner).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: daily report job registered");
    Ok(())
}

async fn run_daily_report_job(runner: &PipelineRunner<PgReportStore>) {
    match runner.run_today().await {
        Ok(outcome) => log_outcome(&outcome),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: daily report run failed");
        }
    }
}

fn log_outcome(outcome: &PipelineOutcome) {
    tracing::info!(
        run_date = %outcome.date(),
        items = outcome.item_count(),
        summary = %outcome.message(),
        "scheduler: daily report run finished"
    );
}
