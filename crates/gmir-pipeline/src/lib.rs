//! Daily map-intelligence report pipeline.
//!
//! Pulls articles from configured feeds, filters them by keyword policy,
//! asks a chat-completion model to structure the survivors into report items,
//! and records everything against one idempotent run per calendar day.

pub mod ai;
pub mod error;
pub mod filter;
pub mod guard;
pub mod ledger;
pub mod pipeline;
pub mod runner;
pub mod sources;
pub mod store;
pub mod types;

pub use ai::{AiClient, AiSettings, ReportItemDraft};
pub use error::{AiError, FetchError, PipelineError, StoreError};
pub use filter::filter_articles;
pub use guard::is_allowed;
pub use ledger::{run_date, RunLedger};
pub use pipeline::{run_pipeline, PipelineContext};
pub use runner::PipelineRunner;
pub use sources::FeedFetcher;
pub use store::{load_inputs, MemoryReportStore, PgReportStore, ReportStore, RunClaim};
pub use types::{Article, PipelineInputs, PipelineOutcome, ReportItem, ReportRun, RunSummary};
