// One-shot batch entry point: load the job config, run the pipeline for the
// configured location, write the scored map to disk.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use demand_metric::{
    write_output, AppConfig, FetchConfig, HttpApi, Pipeline, DEFAULT_BASE_URL,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    tracing::info!(
        location = %config.location,
        amount = config.properties_count,
        "starting demand metric run"
    );

    let api = Arc::new(
        HttpApi::new(DEFAULT_BASE_URL, &config.client_id).context("failed to build API client")?,
    );
    let pipeline = Pipeline::new(api, FetchConfig::default());

    let scores = pipeline
        .run(&config.location, config.properties_count)
        .await
        .context("pipeline run failed")?;

    write_output(&config.output_file, &scores)
        .with_context(|| format!("failed to write {}", config.output_file.display()))?;
    tracing::info!(
        listings = scores.len(),
        output = %config.output_file.display(),
        "demand metric run complete"
    );
    Ok(())
}
