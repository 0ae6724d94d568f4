mod api;
mod middleware;
mod scheduler;

use kpulse_pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = kpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = kpulse_db::PoolConfig::from_app_config(&config);
    let pool = kpulse_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = kpulse_db::run_migrations(&pool).await?;
    tracing::info!(applied, env = %config.env, "database ready");

    let pipeline = Pipeline::from_app_config(&config, pool.clone())?;

    let _scheduler = if config.scheduler_enabled {
        Some(scheduler::build_scheduler(pipeline.clone()).await?)
    } else {
        tracing::info!("in-process scheduler disabled; rely on external cron triggers");
        None
    };

    let auth = AuthState::new(&config.pipeline_secret);
    let app = build_app(AppState { pool, pipeline }, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "kpulse server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
