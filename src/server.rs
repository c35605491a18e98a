use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::{app, AppState};
use crate::clock::SystemClock;
use crate::config::{config, AppConfig, DatastoreBackend};
use crate::database::{DatabaseManager, Datastore, MemoryDatastore, ModelService, PgDatastore};
use crate::observer::ObserverPipeline;
use crate::stats::{writer_from_config, PointWriter};
use crate::tasks::{ChannelTaskQueue, Job, LogNotifier, TaskQueue, TaskWorker};

/// Long-lived services of a running backend
pub struct Runtime {
    pub datastore: Arc<dyn Datastore>,
    pub stats: Arc<dyn PointWriter>,
    pub queue: ChannelTaskQueue,
    pub models: ModelService,
    pub worker: JoinHandle<()>,
}

/// Datastore selected by configuration
pub async fn datastore_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn Datastore>> {
    match config.database.backend {
        DatastoreBackend::Memory => {
            info!("Using in-memory datastore");
            Ok(Arc::new(MemoryDatastore::new()))
        }
        DatastoreBackend::Postgres => {
            let pool = DatabaseManager::pool().await.context("connecting to Postgres")?;
            DatabaseManager::init_schema(&pool).await.context("applying schema")?;
            Ok(Arc::new(PgDatastore::new(pool)))
        }
    }
}

/// Wire datastore, signals, stats sink and the task worker
pub async fn build_runtime(config: &AppConfig) -> anyhow::Result<Runtime> {
    let datastore = datastore_from_config(config).await?;
    let stats = writer_from_config(&config.stats).context("configuring stats writer")?;

    let (queue, receiver) = ChannelTaskQueue::new();
    let worker = TaskWorker::new(receiver, datastore.clone(), stats.clone(), Arc::new(LogNotifier)).spawn();

    let models = ModelService::new(
        datastore.clone(),
        Arc::new(ObserverPipeline::with_default_observers()),
        stats.clone(),
        Arc::new(queue.clone()),
        Arc::new(SystemClock),
    );

    Ok(Runtime { datastore, stats, queue, models, worker })
}

/// Queue a `RecordGroupStats` job every `every`
pub fn spawn_group_stats_schedule(queue: ChannelTaskQueue, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = queue.schedule(Job::RecordGroupStats, Duration::ZERO) {
                error!("Stopping group stats schedule: {}", e);
                break;
            }
        }
    })
}

/// Run the HTTP server until ctrl-c
pub async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    info!("Starting foodsaving backend in {:?} mode", config.environment);

    let runtime = build_runtime(config).await?;
    let schedule = if config.stats.enabled {
        Some(spawn_group_stats_schedule(
            runtime.queue.clone(),
            Duration::from_secs(config.stats.group_stats_interval_secs),
        ))
    } else {
        None
    };

    let router = app(AppState::new(runtime.models.clone()));

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("server error")?;

    if let Some(schedule) = schedule {
        schedule.abort();
    }
    runtime.worker.abort();
    DatabaseManager::close().await;
    Ok(())
}
