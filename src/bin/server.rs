//! HTTP server for the text-to-SQL pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use askdb::api;
use askdb::config::Config;
use askdb::llm::gateway_from_config;
use askdb::pipeline::QueryPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdb=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        port = config.port,
        model = %config.model,
        inference_url = %config.inference_url,
        data_dir = %config.data_dir.display(),
        "starting askdb server"
    );
    if config.llm_stub {
        tracing::warn!("LLM_STUB enabled - inference gateway will generate nothing");
    }

    let gateway = gateway_from_config(&config);
    let pipeline = Arc::new(QueryPipeline::from_config(&config, gateway));
    let app = api::router(pipeline, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("askdb listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
