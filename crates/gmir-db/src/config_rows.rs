//! Read-only access to the configuration tables owned by the settings
//! collaborator: `sources`, `keywords` and `ai_config`.

use gmir_core::{
    AiProvider, AiProviderConfig, Keyword, KeywordKind, Region, Source, SourceKind,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub id: Uuid,
    pub name: String,
    pub source_type: String,
    pub url: String,
    pub parser_type: String,
    pub region_hint: String,
    pub enabled: bool,
}

impl SourceRow {
    #[must_use]
    pub fn into_source(self) -> Source {
        Source {
            id: self.id.to_string(),
            name: self.name,
            kind: SourceKind::from_db(&self.source_type),
            url: self.url,
            parser_hint: self.parser_type,
            region_hint: Region::from_label(&self.region_hint),
            enabled: self.enabled,
        }
    }
}

/// A row from the `keywords` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRow {
    pub id: Uuid,
    pub value: String,
    pub keyword_type: String,
}

impl KeywordRow {
    /// Returns `None` for rows whose type is neither `include` nor `exclude`.
    #[must_use]
    pub fn into_keyword(self) -> Option<Keyword> {
        let kind = match self.keyword_type.as_str() {
            "include" => KeywordKind::Include,
            "exclude" => KeywordKind::Exclude,
            _ => return None,
        };
        Some(Keyword {
            id: self.id.to_string(),
            value: self.value,
            kind,
        })
    }
}

/// A row from the `ai_config` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AiConfigRow {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AiConfigRow {
    #[must_use]
    pub fn into_config(self) -> AiProviderConfig {
        let defaults = AiProviderConfig::default();
        let model = if self.model.trim().is_empty() {
            defaults.model
        } else {
            self.model
        };
        AiProviderConfig {
            provider: AiProvider::from_db(&self.provider),
            model,
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            endpoint_url: self.endpoint_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Returns every enabled source in creation order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enabled_sources(pool: &PgPool) -> Result<Vec<SourceRow>, DbError> {
    let rows = sqlx::query_as::<_, SourceRow>(
        "SELECT id, name, type AS source_type, url, parser_type, region_hint, enabled \
         FROM sources \
         WHERE enabled = true \
         ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all include and exclude keywords.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keywords(pool: &PgPool) -> Result<Vec<KeywordRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordRow>(
        "SELECT id, value, type AS keyword_type \
         FROM keywords \
         ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recently updated AI provider row, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ai_config(pool: &PgPool) -> Result<Option<AiConfigRow>, DbError> {
    let row = sqlx::query_as::<_, AiConfigRow>(
        "SELECT id, provider, model, api_key, endpoint_url \
         FROM ai_config \
         ORDER BY updated_at DESC \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
