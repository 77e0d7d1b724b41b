//! Domain records read and written by the report pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Model used when no `ai_config` row exists.
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";

/// Coarse market region attached to sources and report items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Region {
    #[serde(rename = "NA")]
    Na,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "KR")]
    Kr,
    #[default]
    Unknown,
}

impl Region {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Na => "NA",
            Region::Eu => "EU",
            Region::Kr => "KR",
            Region::Unknown => "Unknown",
        }
    }

    /// Snap a raw label onto a known region. Matching is exact: anything other
    /// than `NA`, `EU` or `KR` becomes [`Region::Unknown`].
    #[must_use]
    pub fn from_label(raw: &str) -> Self {
        match raw {
            "NA" => Region::Na,
            "EU" => Region::Eu,
            "KR" => Region::Kr,
            _ => Region::Unknown,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Feed,
    Page,
}

impl SourceKind {
    /// Map the stored `type` column (`rss` / `html`) to a kind.
    /// Unrecognised values are treated as feeds.
    #[must_use]
    pub fn from_db(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "html" | "page" => SourceKind::Page,
            _ => SourceKind::Feed,
        }
    }
}

/// A configured feed or page to ingest from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    pub parser_hint: String,
    pub region_hint: Region,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: String,
    pub value: String,
    pub kind: KeywordKind,
}

/// Lifecycle of a daily report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(CoreError::InvalidRunStatus(other.to_string())),
        }
    }
}

/// Which completion backend the AI adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AiProvider {
    /// Platform gateway authenticated with the platform key.
    #[default]
    DefaultGateway,
    /// Vendor API called directly with a user-supplied key.
    DirectApi,
}

impl AiProvider {
    /// `google` selects the direct API; every other stored value falls back
    /// to the gateway.
    #[must_use]
    pub fn from_db(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("google") {
            AiProvider::DirectApi
        } else {
            AiProvider::DefaultGateway
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiProviderConfig {
    pub provider: AiProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint_url: Option<String>,
}

impl Default for AiProviderConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::DefaultGateway,
            model: DEFAULT_AI_MODEL.to_string(),
            api_key: None,
            endpoint_url: None,
        }
    }
}

impl fmt::Debug for AiProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}
