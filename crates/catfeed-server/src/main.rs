mod api;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use catfeed_core::FieldMapping;
use catfeed_feed::{FeedConfig, FeedPipeline};
use catfeed_source::HttpCatalogSource;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = catfeed_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mapping = match &config.mapping_path {
        Some(path) => catfeed_core::load_field_mapping(path)?,
        None => FieldMapping::default(),
    };
    tracing::info!(
        env = %config.env,
        source = %config.source_url,
        mapped_fields = mapping.targets().len(),
        protected = config.feed_protected,
        "starting catfeed server"
    );

    let source = HttpCatalogSource::from_app_config(&config)
        .context("failed to build catalog source client")?;
    let feed_config = FeedConfig::from_app_config(&config, mapping);
    let pipeline = FeedPipeline::new(Arc::new(source), Arc::new(feed_config));

    let secret = if config.feed_protected {
        config.feed_secret.clone()
    } else {
        None
    };
    let app = build_app(AppState::new(pipeline, secret), default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
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
