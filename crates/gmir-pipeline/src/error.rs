use thiserror::Error;

/// Failure while fetching a single source. Never escapes the fetcher; it is
/// logged and the source contributes no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("blocked URL: {0}")]
    Blocked(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured for provider {0}")]
    MissingApiKey(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned status {0}")]
    Status(u16),

    #[error("completion body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("completion content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("completion content is not a JSON array")]
    NotAnArray,
}

impl AiError {
    /// `true` when the service answered but its payload could not be used.
    #[must_use]
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            AiError::InvalidBody(_) | AiError::Parse(_) | AiError::NotAnArray
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] gmir_db::DbError),

    #[error("report run {0} not found")]
    RunNotFound(i64),

    #[error(transparent)]
    InvalidStatus(#[from] gmir_core::CoreError),

    #[error("report run {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: gmir_core::RunStatus,
        to: gmir_core::RunStatus,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Db(gmir_db::DbError::Sqlx(err))
    }
}

/// Fatal pipeline failure. Source-level problems never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("AI summarization failed: {0}")]
    Ai(#[from] AiError),

    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Generic, caller-safe message. Internal detail stays in the logs.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            PipelineError::Ai(e) if e.is_malformed_response() => "Failed to parse AI response",
            PipelineError::Ai(_) => "AI summarization failed",
            PipelineError::Store(_) => "Pipeline failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_message_separates_call_and_parse_failures() {
        let call = PipelineError::Ai(AiError::Status(502));
        assert_eq!(call.public_message(), "AI summarization failed");

        let parse = PipelineError::Ai(AiError::NotAnArray);
        assert_eq!(parse.public_message(), "Failed to parse AI response");

        let store = PipelineError::Store(StoreError::RunNotFound(7));
        assert_eq!(store.public_message(), "Pipeline failed");
    }

    #[test]
    fn missing_key_is_a_call_failure() {
        assert!(!AiError::MissingApiKey("default-gateway").is_malformed_response());
    }
}
