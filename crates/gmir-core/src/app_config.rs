use std::net::SocketAddr;

use chrono::FixedOffset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_concurrent: usize,
    pub ai_timeout_secs: u64,
    /// Offset used to decide which calendar day a run belongs to.
    pub run_utc_offset: FixedOffset,
    pub pipeline_cron: String,
    pub pipeline_secret: Option<String>,
    pub service_role_key: Option<String>,
    pub pipeline_url: String,
    pub gateway_api_key: Option<String>,
    pub direct_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_max_concurrent", &self.fetch_max_concurrent)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("run_utc_offset", &self.run_utc_offset)
            .field("pipeline_cron", &self.pipeline_cron)
            .field("pipeline_secret", &redact(&self.pipeline_secret))
            .field("service_role_key", &redact(&self.service_role_key))
            .field("pipeline_url", &self.pipeline_url)
            .field("gateway_api_key", &redact(&self.gateway_api_key))
            .field("direct_api_key", &redact(&self.direct_api_key))
            .finish()
    }
}
