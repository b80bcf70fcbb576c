use actix_web::web;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod alerts;
mod api;
mod config;
mod domain;
mod health;
mod metrics;
mod store;
mod utils;
mod views;

use actors::{ConsumerLease, LiveOrders};
use alerts::{AlertMonitor, AlertPlayer, ConsoleBell};
use api::AppState;
use config::AppConfig;
use metrics::Metrics;
use store::{HttpOrderSource, InMemorySource, OrderSource, OrderStore, RefreshOutcome, RefreshTrigger};
use utils::{CircuitBreaker, CircuitBreakerConfig};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_desk=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order desk");

    // === 1. Configuration ===
    let config = AppConfig::from_env()?;
    tracing::info!(
        addr = %config.addr,
        refresh_ms = config.refresh_interval_ms,
        transitions = ?config.transitions,
        remote = config.api_url.is_some(),
        "Configuration loaded"
    );

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Order source ===
    let (source, ingest): (Arc<dyn OrderSource>, Option<Arc<InMemorySource>>) = match &config.api_url {
        Some(url) => {
            let hook_metrics = metrics.clone();
            let breaker = CircuitBreaker::new("order_api", CircuitBreakerConfig::default())
                .with_transition_hook(move |name, from, to| {
                    tracing::warn!(breaker = name, from = from.as_str(), to = to.as_str(), "Circuit breaker transition");
                    hook_metrics.record_circuit_breaker_transition(from.as_str(), to.as_str(), to.as_gauge());
                });
            let http = HttpOrderSource::new(url, config.request_timeout)?.with_breaker(breaker);
            tracing::info!(base_url = %url, "Using remote order API");
            (Arc::new(http), None)
        }
        None => {
            let memory = Arc::new(InMemorySource::seeded());
            tracing::info!(orders = memory.order_count(), "Using in-memory order source with sample orders");
            (memory.clone(), Some(memory))
        }
    };

    // === 4. Store, polling and alert ===
    let store = OrderStore::new(source, config.transitions).with_metrics(metrics.clone());
    let live = LiveOrders::new(store.clone(), config.refresh_interval_ms);

    let bell = Arc::new(ConsoleBell::new(Some(metrics.clone())));
    let (alert, lease) = start_live_desk(&live, bell, Some(metrics.clone())).await;

    // === 5. HTTP API ===
    let state = web::Data::new(AppState::new(live, ingest, metrics));
    let result = api::start_api_server(state, config.addr).await;

    drop(lease);
    alert.shutdown();
    tracing::info!("🛑 Order desk stopped");

    result?;
    Ok(())
}

/// Load the collection once, then take the alert baseline, then mount the
/// desk itself as the long-lived consumer. Must run inside an actix system.
async fn start_live_desk(
    live: &LiveOrders,
    player: Arc<dyn AlertPlayer>,
    metrics: Option<Arc<Metrics>>,
) -> (AlertMonitor, ConsumerLease) {
    match live.store().refresh_with(RefreshTrigger::Mount).await {
        RefreshOutcome::Applied { count } => tracing::info!(count, "Initial orders loaded"),
        other => tracing::warn!(outcome = ?other, "Initial order load did not apply, alert baseline is empty"),
    }

    let alert = AlertMonitor::spawn(live.store().subscribe(), player, metrics);
    let lease = live.mount();
    (alert, lease)
}
