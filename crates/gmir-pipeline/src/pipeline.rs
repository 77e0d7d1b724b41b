//! Report pipeline orchestration.

use chrono::{NaiveDate, Utc};

use crate::ai::{sanitize_drafts, AiClient, AiSettings};
use crate::error::PipelineError;
use crate::filter::filter_articles;
use crate::ledger::RunLedger;
use crate::sources::FeedFetcher;
use crate::store::{ReportStore, RunClaim};
use crate::types::{PipelineInputs, PipelineOutcome, ReportRun, RunSummary};

/// Collaborators shared by every run.
pub struct PipelineContext<'a, S> {
    pub store: &'a S,
    pub fetcher: &'a FeedFetcher,
    pub ai: &'a AiSettings,
}

/// Run the full pipeline for `run_date`.
///
/// 1. Claim the run. An already completed date returns immediately without
///    fetching, calling the model or touching items.
/// 2. Fetch all sources (bounded fan-out, failures isolated per source).
/// 3. Dedup and keyword-filter; record both counters.
/// 4. Zero survivors complete the run with no items and no model call.
/// 5. Structure the survivors with the model, sanitize, replace the run's
///    items and complete the run.
///
/// # Errors
///
/// Returns [`PipelineError::Ai`] if the model call or its response fails
/// (the run is marked failed), or [`PipelineError::Store`] if persistence
/// fails (the run is never marked completed).
pub async fn run_pipeline<S: ReportStore>(
    ctx: &PipelineContext<'_, S>,
    inputs: &PipelineInputs,
    run_date: NaiveDate,
) -> Result<PipelineOutcome, PipelineError> {
    let ledger = RunLedger::new(ctx.store);

    let run = match ledger.begin(run_date).await? {
        RunClaim::Started(run) => run,
        RunClaim::AlreadyCompleted => {
            return Ok(PipelineOutcome::AlreadyCompleted { date: run_date });
        }
    };

    match execute(ctx, &ledger, &run, inputs).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(run_date = %run_date, error = %e, "report pipeline failed");
            ledger.fail_best_effort(&run, e.public_message()).await;
            Err(e)
        }
    }
}

async fn execute<S: ReportStore>(
    ctx: &PipelineContext<'_, S>,
    ledger: &RunLedger<'_, S>,
    run: &ReportRun,
    inputs: &PipelineInputs,
) -> Result<PipelineOutcome, PipelineError> {
    let articles = ctx.fetcher.fetch_all(&inputs.sources).await;
    let filtered = filter_articles(&articles, &inputs.include_terms, &inputs.exclude_terms);

    tracing::info!(
        run_date = %run.date,
        sources = inputs.sources.len(),
        total = articles.len(),
        filtered = filtered.len(),
        "articles collected"
    );
    ledger
        .record_counts(run, articles.len(), filtered.len())
        .await?;

    if filtered.is_empty() {
        ledger.complete(run).await?;
        return Ok(PipelineOutcome::NoRelevantArticles {
            date: run.date,
            total_articles: articles.len(),
        });
    }

    let client = AiClient::new(&inputs.ai, ctx.ai)?;
    let drafts = client.summarize(&filtered).await?;
    let items = sanitize_drafts(&drafts, Utc::now());

    let written = ctx.store.replace_items(run.id, &items).await?;
    ledger.complete(run).await?;
    tracing::info!(run_date = %run.date, items = written, "report items stored");

    Ok(PipelineOutcome::Completed(RunSummary {
        date: run.date,
        total_articles: articles.len(),
        filtered_articles: filtered.len(),
        items,
    }))
}
