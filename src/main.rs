//! NewsBrief ingestion service: binary entrypoint.
//! Wires provider, enrichment clients and storage, starts the daily scheduler
//! and serves the admin HTTP surface.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsbrief_ingest::analyze::build_clients_from_config;
use newsbrief_ingest::config::ai::AiConfig;
use newsbrief_ingest::config::ingest::{load_catalog_default, IngestConfig};
use newsbrief_ingest::ingest::providers::news_provider::NewsProviderClient;
use newsbrief_ingest::ingest::scheduler::spawn_daily_ingestion;
use newsbrief_ingest::ingest::types::UuidGenerator;
use newsbrief_ingest::metrics::Metrics;
use newsbrief_ingest::news::NewsService;
use newsbrief_ingest::store::memory::MemoryStore;
use newsbrief_ingest::{router, AppState, IngestionDeps, ProviderIngestion};

/// Compact logs by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsbrief_ingest=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Shuttle may already have installed a subscriber; ignore that case.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = Metrics::init();

    let ingest_cfg = IngestConfig::from_env().context("loading ingest config")?;
    let catalog = load_catalog_default().context("loading topic catalog")?;
    let ai_cfg = AiConfig::load_default().context("loading AI config")?;
    let clients = build_clients_from_config(&ai_cfg).context("building enrichment clients")?;
    let provider = NewsProviderClient::from_url(&ingest_cfg.provider_url)?;

    tracing::info!(
        provider_url = %ingest_cfg.provider_url,
        ai = clients.provider,
        topics = catalog.slugs().count(),
        "starting ingestion service"
    );

    let store = Arc::new(MemoryStore::new());
    let ids = Arc::new(UuidGenerator);
    let ingestion = Arc::new(ProviderIngestion::new(IngestionDeps {
        provider: Arc::new(provider),
        summarizer: clients.summarizer,
        classifier: clients.classifier,
        translator: clients.translator.clone(),
        topics: store.clone(),
        sources: store.clone(),
        news: store.clone(),
        ids: ids.clone(),
        catalog: Arc::new(catalog),
    }));
    let news = Arc::new(NewsService::new(store, clients.translator, ids));

    if ingest_cfg.scheduled_enabled {
        spawn_daily_ingestion(ingestion.clone(), ingest_cfg.clone());
    } else {
        tracing::info!(target: "scheduler", "scheduled provider ingestion disabled");
    }

    let app = router(AppState { ingestion, news }, Some(&metrics));
    Ok(app.into())
}
