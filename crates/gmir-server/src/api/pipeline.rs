use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use gmir_pipeline::{PipelineError, PipelineOutcome};
use serde::Serialize;

use crate::middleware::{RequestId, PIPELINE_SECRET_HEADER};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Result payload of one pipeline invocation.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct PipelineResultData {
    status: &'static str,
    message: String,
    date: NaiveDate,
    total: Option<usize>,
    filtered: Option<usize>,
    items: usize,
}

impl From<&PipelineOutcome> for PipelineResultData {
    fn from(outcome: &PipelineOutcome) -> Self {
        let (total, filtered) = match outcome {
            PipelineOutcome::AlreadyCompleted { .. } => (None, None),
            PipelineOutcome::NoRelevantArticles { total_articles, .. } => {
                (Some(*total_articles), Some(0))
            }
            PipelineOutcome::Completed(summary) => (
                Some(summary.total_articles),
                Some(summary.filtered_articles),
            ),
        };
        Self {
            status: "completed",
            message: outcome.message(),
            date: outcome.date(),
            total,
            filtered,
            items: outcome.item_count(),
        }
    }
}

fn pipeline_error_code(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::Ai(e) if e.is_malformed_response() => "ai_parse_failed",
        PipelineError::Ai(_) => "ai_failed",
        PipelineError::Store(_) => "internal_error",
    }
}

/// Privileged trigger: runs today's pipeline in-process.
pub(super) async fn run_pipeline(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PipelineResultData>>, ApiError> {
    tracing::info!(request_id = %req_id.0, "pipeline run requested");

    let outcome = state.runner.run_today().await.map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            pipeline_error_code(&e),
            e.public_message(),
        )
    })?;

    Ok(Json(ApiResponse {
        data: PipelineResultData::from(&outcome),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Forwards user-initiated triggers to the privileged endpoint with the
/// shared secret attached.
pub struct TriggerForwarder {
    client: reqwest::Client,
    target_url: String,
    pipeline_secret: Option<String>,
    service_role_key: Option<String>,
}

impl TriggerForwarder {
    pub fn new(
        target_url: &str,
        pipeline_secret: Option<String>,
        service_role_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            target_url: target_url.to_string(),
            pipeline_secret,
            service_role_key,
        })
    }

    /// The privileged run may take as long as the AI call plus all fetches.
    pub fn from_app_config(config: &gmir_core::AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.pipeline_url,
            config.pipeline_secret.clone(),
            config.service_role_key.clone(),
            config.ai_timeout_secs + config.fetch_timeout_secs * 2 + 30,
        )
    }

    async fn forward(&self, request_id: &str) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(&self.target_url)
            .header("x-request-id", request_id)
            .header(header::CONTENT_TYPE, "application/json")
            .body("{}");
        if let Some(secret) = &self.pipeline_secret {
            request = request.header(PIPELINE_SECRET_HEADER, secret);
        } else if let Some(key) = &self.service_role_key {
            request = request.bearer_auth(key);
        }
        request.send().await
    }
}

/// User-facing trigger: relays the privileged endpoint's status and body.
pub(super) async fn trigger_pipeline(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let upstream = state.forwarder.forward(&req_id.0).await.map_err(|e| {
        tracing::error!(error = %e, "pipeline trigger forward failed");
        ApiError::new(req_id.0.clone(), "bad_gateway", "pipeline service unreachable")
    })?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = upstream.bytes().await.map_err(|e| {
        tracing::error!(error = %e, "pipeline trigger response unreadable");
        ApiError::new(req_id.0.clone(), "bad_gateway", "pipeline service unreachable")
    })?;

    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(body),
    )
        .into_response())
}
