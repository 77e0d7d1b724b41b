//! AI structuring adapter: prompt, provider dispatch, typed response parsing
//! and sanitization.

mod prompt;
mod response;
mod sanitize;

use std::fmt;
use std::time::Duration;

use gmir_core::{AiProvider, AiProviderConfig, AppConfig};
use serde_json::{json, Value};

use crate::error::AiError;
use crate::types::Article;

pub use prompt::{build_manifest, MAX_PROMPT_ARTICLES, SYSTEM_PROMPT};
pub use response::{completion_content, parse_drafts, strip_code_fences, ReportItemDraft};
pub use sanitize::{sanitize_draft, sanitize_drafts};

pub const DEFAULT_GATEWAY_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DIRECT_API_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 8000;
const ERROR_BODY_LOG_CHARS: usize = 500;

/// Process-level AI credentials and limits. Per-run provider choice comes
/// from [`AiProviderConfig`].
#[derive(Clone, Default)]
pub struct AiSettings {
    /// Platform key for the default gateway.
    pub gateway_api_key: Option<String>,
    /// Fallback key for the direct API when the config row carries none.
    pub direct_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AiSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            gateway_api_key: config.gateway_api_key.clone(),
            direct_api_key: config.direct_api_key.clone(),
            timeout_secs: config.ai_timeout_secs,
        }
    }
}

impl fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiSettings")
            .field("gateway_api_key", &self.gateway_api_key.as_ref().map(|_| "[redacted]"))
            .field("direct_api_key", &self.direct_api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Where and with which key the completion request goes.
#[derive(Clone, PartialEq, Eq)]
pub struct AiRoute {
    pub endpoint: String,
    pub api_key: String,
}

impl fmt::Debug for AiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiRoute")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

/// Resolve endpoint and key for the configured provider.
///
/// Direct API: fixed vendor endpoint, key from the config row or else the
/// process fallback. Gateway: endpoint override or the built-in default, key
/// from the platform environment.
///
/// # Errors
///
/// Returns [`AiError::MissingApiKey`] if no key is available.
pub fn resolve_route(config: &AiProviderConfig, settings: &AiSettings) -> Result<AiRoute, AiError> {
    let non_blank = |key: Option<&String>| key.filter(|k| !k.trim().is_empty()).cloned();

    match config.provider {
        AiProvider::DirectApi => {
            let api_key = non_blank(config.api_key.as_ref())
                .or_else(|| non_blank(settings.direct_api_key.as_ref()))
                .ok_or(AiError::MissingApiKey("direct-api"))?;
            Ok(AiRoute {
                endpoint: DIRECT_API_ENDPOINT.to_string(),
                api_key,
            })
        }
        AiProvider::DefaultGateway => {
            let api_key = non_blank(settings.gateway_api_key.as_ref())
                .ok_or(AiError::MissingApiKey("default-gateway"))?;
            let endpoint = config
                .endpoint_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_GATEWAY_ENDPOINT)
                .to_string();
            Ok(AiRoute { endpoint, api_key })
        }
    }
}

/// OpenAI-compatible chat completions client for one run.
pub struct AiClient {
    client: reqwest::Client,
    route: AiRoute,
    model: String,
}

impl AiClient {
    /// # Errors
    ///
    /// Returns [`AiError::MissingApiKey`] if no key resolves for the provider,
    /// or [`AiError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &AiProviderConfig, settings: &AiSettings) -> Result<Self, AiError> {
        let route = resolve_route(config, settings)?;
        let timeout = if settings.timeout_secs == 0 {
            DEFAULT_AI_TIMEOUT_SECS
        } else {
            settings.timeout_secs
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self {
            client,
            route,
            model: config.model.clone(),
        })
    }

    #[must_use]
    pub fn route(&self) -> &AiRoute {
        &self.route
    }

    /// Ask the model to structure `articles` (first [`MAX_PROMPT_ARTICLES`]
    /// only) and return the unvalidated drafts.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on transport failure, a non-2xx status, or a body
    /// whose content is not a JSON array.
    pub async fn summarize(&self, articles: &[Article]) -> Result<Vec<ReportItemDraft>, AiError> {
        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_manifest(articles) }
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        });

        let response = self
            .client
            .post(&self.route.endpoint)
            .bearer_auth(&self.route.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LOG_CHARS).collect();
            tracing::error!(status = status.as_u16(), body = %excerpt, "completion request failed");
            return Err(AiError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| AiError::InvalidBody(e.to_string()))?;
        let content = completion_content(&body).inspect_err(|e| {
            tracing::error!(error = %e, "unexpected completion content shape");
        })?;

        let drafts = parse_drafts(content).inspect_err(|e| {
            let excerpt: String = content.chars().take(ERROR_BODY_LOG_CHARS).collect();
            tracing::error!(error = %e, content = %excerpt, "unparsable completion content");
        })?;

        tracing::info!(
            articles = articles.len().min(MAX_PROMPT_ARTICLES),
            drafts = drafts.len(),
            model = %self.model,
            "completion parsed"
        );
        Ok(drafts)
    }
}
