//! Feed fetching: guarded HTTP retrieval plus article extraction.

mod extract;

use std::time::Duration;

use futures::stream::{self, StreamExt};
use gmir_core::{AppConfig, Source};
use reqwest::redirect;

use crate::error::FetchError;
use crate::guard;
use crate::types::Article;

pub const DEFAULT_USER_AGENT: &str = "GMIR-Bot/1.0 (+report pipeline)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
const MAX_REDIRECTS: usize = 5;

/// Fetches sources over HTTP and turns their documents into [`Article`]s.
///
/// Every outbound URL, including each redirect hop, passes through
/// [`guard::is_allowed`] first.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    max_concurrent: usize,
}

impl FeedFetcher {
    /// Build a fetcher with a per-request timeout and user-agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_concurrent: usize,
    ) -> Result<Self, FetchError> {
        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent);
        Self::from_builder(builder, max_concurrent)
    }

    /// Finish a caller-configured client builder with the guarded redirect
    /// policy installed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn from_builder(
        builder: reqwest::ClientBuilder,
        max_concurrent: usize,
    ) -> Result<Self, FetchError> {
        let client = builder.redirect(guarded_redirect_policy()).build()?;
        Ok(Self::with_client(client, max_concurrent))
    }

    /// Build a fetcher from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.fetch_timeout_secs,
            &config.fetch_user_agent,
            config.fetch_max_concurrent,
        )
    }

    /// Wrap a preconfigured client as-is; its redirect policy is not
    /// replaced.
    #[must_use]
    pub fn with_client(client: reqwest::Client, max_concurrent: usize) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetch one source. Failures of any kind are logged and yield no
    /// articles; this never returns an error.
    pub async fn fetch(&self, source: &Source) -> Vec<Article> {
        match self.try_fetch(source).await {
            Ok(articles) => {
                tracing::debug!(
                    source = %source.name,
                    count = articles.len(),
                    "fetched source"
                );
                articles
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    url = %source.url,
                    error = %e,
                    "source fetch failed, skipping"
                );
                Vec::new()
            }
        }
    }

    /// Fetch every source with a bounded fan-out. Output order follows the
    /// order of `sources`, regardless of which request finishes first.
    pub async fn fetch_all(&self, sources: &[Source]) -> Vec<Article> {
        let fetches: Vec<_> = sources.iter().map(|source| self.fetch(source)).collect();
        let per_source: Vec<Vec<Article>> = stream::iter(fetches)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        per_source.into_iter().flatten().collect()
    }

    async fn try_fetch(&self, source: &Source) -> Result<Vec<Article>, FetchError> {
        if !guard::is_allowed(&source.url) {
            return Err(FetchError::Blocked(source.url.clone()));
        }

        let response = self.client.get(source.url.trim()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: source.url.clone(),
            });
        }

        let body = response.text().await?;
        Ok(extract::extract_articles(&body, source))
    }
}

/// Follows redirects only while every hop stays on an allowed host.
fn guarded_redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if guard::is_allowed(attempt.url().as_str()) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}
