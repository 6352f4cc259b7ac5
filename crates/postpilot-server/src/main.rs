mod api;
mod automation;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    automation::Automation,
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = postpilot_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = postpilot_db::PoolConfig::from_app_config(&config);
    let pool = postpilot_db::connect_pool(&config.database_url, pool_config).await?;
    postpilot_db::run_migrations(&pool).await?;

    let llm = postpilot_llm::LlmClient::new(&config.llm)?;
    let news = postpilot_news::NewsClient::new(&config.feed)?;
    let sources = postpilot_core::load_sources(&config.sources_path)?.enabled();
    if sources.is_empty() {
        tracing::warn!("no enabled news sources; scheduled collection will be a no-op");
    }

    let publisher = if config.linkedin.access_token.is_some() && config.linkedin.author_urn.is_some()
    {
        Some(postpilot_linkedin::LinkedinClient::new(&config.linkedin)?)
    } else {
        tracing::warn!("LinkedIn credentials not configured; posts will stay scheduled");
        None
    };

    let pipeline = Arc::new(postpilot_pipeline::Pipeline::new(
        pool.clone(),
        llm,
        news,
        sources,
        config.pipeline.clone(),
        config.feed.lookback_hours,
    ));

    let automation = Arc::new(Automation::new(
        Arc::clone(&pipeline),
        pool.clone(),
        publisher,
        config.pipeline.clone(),
    ));

    // Unattended by default; the API can stop/start it at runtime.
    automation.start().await.map_err(|e| anyhow::anyhow!("failed to start automation: {e}"))?;

    let auth = AuthState::from_env(matches!(
        config.env,
        postpilot_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            automation,
            pipeline,
        },
        auth,
        default_rate_limit_state(),
    );

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
