use crate::handlers::Handlers;
use crate::ingest::{EventSource, JsonlSource};
use crate::metadata::RpcMetadataSource;
use crate::pipeline::Pipeline;
use crate::store::{EntityStore, PgStore};
use crate::watcher::WatchedPools;
use sqlx::PgPool;
use std::sync::Arc;
use swapledger_core::{Config, Result};
use tracing::{info, instrument};

pub struct App {
    pipeline: Pipeline,
}

impl App {
    #[instrument(skip(config, pool))]
    pub async fn new(config: Config, pool: PgPool) -> Result<Self> {
        info!("Initializing application");

        let store = Arc::new(PgStore::new(pool));

        let metadata = Arc::new(RpcMetadataSource::new(
            config.rpc.endpoint.clone(),
            config.rpc.timeout_secs,
        )?);

        let watcher = Arc::new(WatchedPools::new());

        let source = Arc::new(JsonlSource::new(
            config.ingest.archive_dir.clone(),
            config.ingest.batch_size,
        ));

        info!("Performing health checks");
        store.health_check().await?;
        source.health_check().await?;

        let handlers = Handlers::new(store.clone(), metadata, watcher);
        let pipeline = Pipeline::new(source, store, handlers, config);

        Ok(Self { pipeline })
    }

    pub async fn run(&self) -> Result<()> {
        self.pipeline.run().await
    }
}
