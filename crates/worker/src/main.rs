//! Progression worker: wires the pool, the buses, the inbound signal
//! listener, and the event persistence loop.

mod config;

use std::sync::Arc;

use pathways_engine::{CourseSignalListener, ProgressService};
use pathways_events::{EventBus, EventPersistence, SignalBus};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pathways_worker=debug,pathways_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    let pool = pathways_db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    let signal_bus = Arc::new(SignalBus::new(config.event_bus_capacity));

    let persistence = tokio::spawn(EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    let progress = Arc::new(ProgressService::new(pool.clone(), event_bus.clone()));
    let listener = CourseSignalListener::new(progress);
    let cancel = CancellationToken::new();
    let listener_task = tokio::spawn(listener.run(signal_bus.subscribe(), cancel.clone()));

    tracing::info!("Progression worker started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    listener_task.await?;
    drop(event_bus);
    persistence.await?;

    Ok(())
}
