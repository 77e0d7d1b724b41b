//! Shared domain types and application configuration for GMIR.

pub mod app_config;
pub mod config;
pub mod domain;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    AiProvider, AiProviderConfig, Keyword, KeywordKind, Region, RunStatus, Source, SourceKind,
    DEFAULT_AI_MODEL,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid run status: {0}")]
    InvalidRunStatus(String),
}
