use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const PIPELINE_SECRET_HEADER: &str = "x-pipeline-secret";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Session bearer auth for user-facing routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `GMIR_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("GMIR_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "GMIR_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "GMIR_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

/// Shared-secret auth for the privileged pipeline trigger.
///
/// Accepts `x-pipeline-secret: <pipeline secret>` or
/// `Authorization: Bearer <service role key>`. Secrets are kept only as
/// SHA-256 digests and compared in constant time.
#[derive(Clone)]
pub struct PipelineAuth {
    secret_digest: Option<[u8; 32]>,
    service_role_digest: Option<[u8; 32]>,
    pub enabled: bool,
}

impl std::fmt::Debug for PipelineAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAuth")
            .field("secret", &self.secret_digest.map(|_| "[redacted]"))
            .field("service_role", &self.service_role_digest.map(|_| "[redacted]"))
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl PipelineAuth {
    /// With neither secret configured the trigger is open in development and
    /// startup fails everywhere else.
    pub fn new(
        pipeline_secret: Option<&str>,
        service_role_key: Option<&str>,
        is_development: bool,
    ) -> anyhow::Result<Self> {
        let digest = |s: Option<&str>| s.filter(|v| !v.trim().is_empty()).map(sha256);
        let secret_digest = digest(pipeline_secret);
        let service_role_digest = digest(service_role_key);

        if secret_digest.is_none() && service_role_digest.is_none() {
            if is_development {
                tracing::warn!(
                    "GMIR_PIPELINE_SECRET not set; pipeline trigger is open in development environment"
                );
                return Ok(Self {
                    secret_digest,
                    service_role_digest,
                    enabled: false,
                });
            }

            anyhow::bail!(
                "GMIR_PIPELINE_SECRET or GMIR_SERVICE_ROLE_KEY is required outside development"
            );
        }

        Ok(Self {
            secret_digest,
            service_role_digest,
            enabled: true,
        })
    }

    pub fn from_app_config(config: &gmir_core::AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.pipeline_secret.as_deref(),
            config.service_role_key.as_deref(),
            matches!(config.env, gmir_core::Environment::Development),
        )
    }

    fn allows(&self, headers: &HeaderMap) -> bool {
        let secret_ok = headers
            .get(PIPELINE_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|candidate| digest_matches(self.secret_digest.as_ref(), candidate));
        let bearer_ok = extract_bearer_token(headers.get(AUTHORIZATION))
            .is_some_and(|candidate| digest_matches(self.service_role_digest.as_ref(), candidate));
        secret_ok || bearer_ok
    }
}

fn sha256(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

fn digest_matches(expected: Option<&[u8; 32]>, candidate: &str) -> bool {
    let actual = sha256(candidate);
    expected.is_some_and(|expected| bool::from(expected.as_slice().ct_eq(actual.as_slice())))
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Middleware guarding the privileged trigger. Rejects before any work runs.
pub async fn require_pipeline_secret(
    State(auth): State<PipelineAuth>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled || auth.allows(req.headers()) {
        return next.run(req).await;
    }

    tracing::warn!("pipeline trigger rejected: missing or invalid credentials");
    reject(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

pub(crate) fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
