mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use gmir_pipeline::{PgReportStore, PipelineRunner};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState, TriggerForwarder},
    middleware::{AuthState, PipelineAuth},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = gmir_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = gmir_db::PoolConfig::from_app_config(&config);
    let pool = gmir_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = gmir_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let runner = Arc::new(PipelineRunner::from_app_config(
        PgReportStore::new(pool.clone()),
        pool.clone(),
        &config,
    )?);
    let _scheduler = scheduler::build_scheduler(Arc::clone(&runner), &config.pipeline_cron).await?;

    let is_development = matches!(config.env, gmir_core::Environment::Development);
    let auth = AuthState::from_env(is_development)?;
    let pipeline_auth = PipelineAuth::from_app_config(&config)?;
    let forwarder = Arc::new(TriggerForwarder::from_app_config(&config)?);

    let app = build_app(
        AppState {
            pool,
            runner,
            forwarder,
        },
        auth,
        pipeline_auth,
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, "gmir-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
