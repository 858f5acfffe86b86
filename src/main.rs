use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vacation_api::{
    config::Config,
    routes::{create_router, AppState},
    services::{CorpusSource, CsvCorpus, RecommenderService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vacation_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        model_dir = %config.model_dir.display(),
        survey_csv = %config.survey_csv_path.display(),
        features = ?config.features,
        "Configuration loaded"
    );

    let recommender = Arc::new(RecommenderService::from_config(&config));
    let corpus = Arc::new(CsvCorpus::new(config.survey_csv_path.clone()));

    // Train from the CSV only when it is actually there
    let fallback: Option<&dyn CorpusSource> = if corpus.exists() {
        Some(corpus.as_ref())
    } else {
        None
    };
    match recommender.initialize(fallback).await {
        Ok(metadata) => tracing::info!(
            corpus_size = metadata.corpus_size,
            dimensions = metadata.dimensions,
            "Recommender ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Starting with an untrained recommender"),
    }

    let app = create_router(AppState::new(recommender, corpus));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
