use chrono::{DateTime, NaiveDate, Utc};
use gmir_core::{AiProviderConfig, Keyword, KeywordKind, Region, RunStatus, Source};
use serde::Serialize;
use uuid::Uuid;

/// An article extracted from a source document. Lives only for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub source_name: String,
    pub region: Region,
}

/// A sanitized report item, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub region: Region,
    pub title_en: String,
    pub title_ko: String,
    pub summary_en: Vec<String>,
    pub summary_ko: Vec<String>,
    pub impact_en: String,
    pub impact_ko: String,
    pub tags: Vec<String>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    /// Always within `[0, 1]`.
    pub relevance_score: f64,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

/// Ledger view of one daily run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRun {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: Uuid,
    pub date: NaiveDate,
    pub status: RunStatus,
    pub total_articles: usize,
    pub filtered_articles: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything a run reads from configuration, loaded once at run start.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub sources: Vec<Source>,
    /// Lower-cased and non-empty; surrounding spaces are kept.
    pub include_terms: Vec<String>,
    /// Lower-cased and non-empty; surrounding spaces are kept.
    pub exclude_terms: Vec<String>,
    pub ai: AiProviderConfig,
}

impl PipelineInputs {
    /// Builds inputs from raw configuration rows. Disabled sources are dropped
    /// and keyword values are normalized.
    #[must_use]
    pub fn new(sources: Vec<Source>, keywords: &[Keyword], ai: AiProviderConfig) -> Self {
        let terms = |kind: KeywordKind| -> Vec<String> {
            keywords
                .iter()
                .filter(|k| k.kind == kind)
                .map(|k| k.value.to_lowercase())
                .filter(|v| !v.is_empty())
                .collect()
        };

        Self {
            sources: sources.into_iter().filter(|s| s.enabled).collect(),
            include_terms: terms(KeywordKind::Include),
            exclude_terms: terms(KeywordKind::Exclude),
            ai,
        }
    }
}

/// Counters and items from a run that reached the AI stage.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub total_articles: usize,
    pub filtered_articles: usize,
    pub items: Vec<ReportItem>,
}

/// How a pipeline invocation ended when it did not fail.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The run for this date was already completed; nothing was touched.
    AlreadyCompleted { date: NaiveDate },
    /// Fetch and filter ran but nothing survived; the run is completed empty.
    NoRelevantArticles {
        date: NaiveDate,
        total_articles: usize,
    },
    Completed(RunSummary),
}

impl PipelineOutcome {
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            PipelineOutcome::AlreadyCompleted { date }
            | PipelineOutcome::NoRelevantArticles { date, .. } => *date,
            PipelineOutcome::Completed(summary) => summary.date,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            PipelineOutcome::AlreadyCompleted { date } => {
                format!("Report already completed for {date}")
            }
            PipelineOutcome::NoRelevantArticles { .. } => "No relevant articles found".to_string(),
            PipelineOutcome::Completed(_) => "Pipeline complete".to_string(),
        }
    }

    /// Number of items persisted by this invocation.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            PipelineOutcome::Completed(summary) => summary.items.len(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmir_core::SourceKind;

    fn source(name: &str, enabled: bool) -> Source {
        Source {
            id: name.to_string(),
            name: name.to_string(),
            kind: SourceKind::Feed,
            url: format!("https://{name}.example/feed"),
            parser_hint: "rss".to_string(),
            region_hint: Region::Na,
            enabled,
        }
    }

    fn keyword(value: &str, kind: KeywordKind) -> Keyword {
        Keyword {
            id: value.to_string(),
            value: value.to_string(),
            kind,
        }
    }

    #[test]
    fn inputs_normalize_terms_and_drop_disabled_sources() {
        let inputs = PipelineInputs::new(
            vec![source("on", true), source("off", false)],
            &[
                keyword("Google Maps", KeywordKind::Include),
                keyword("", KeywordKind::Include),
                keyword("WAZE", KeywordKind::Exclude),
            ],
            AiProviderConfig::default(),
        );

        assert_eq!(inputs.sources.len(), 1);
        assert_eq!(inputs.sources[0].name, "on");
        assert_eq!(inputs.include_terms, vec!["google maps".to_string()]);
        assert_eq!(inputs.exclude_terms, vec!["waze".to_string()]);
    }

    #[test]
    fn inputs_keep_spaces_around_terms() {
        let inputs = PipelineInputs::new(
            vec![],
            &[keyword(" Ad ", KeywordKind::Exclude)],
            AiProviderConfig::default(),
        );
        assert_eq!(inputs.exclude_terms, vec![" ad ".to_string()]);
    }

    #[test]
    fn outcome_messages() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(
            PipelineOutcome::AlreadyCompleted { date }.message(),
            "Report already completed for 2026-03-04"
        );
        let none = PipelineOutcome::NoRelevantArticles {
            date,
            total_articles: 3,
        };
        assert_eq!(none.message(), "No relevant articles found");
        assert_eq!(none.item_count(), 0);
        assert_eq!(none.date(), date);
    }
}
