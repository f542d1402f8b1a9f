use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nagios_aggregator::{
    aggregator::{FileAggregator, MergePolicy},
    api::{self, ApiConfig, ApiState},
    cache::ResponseCache,
    config::{Config, StorageConfig, read_config_file},
    metrics::ServiceMetrics,
    middleware::{CachingLayer, InstrumentingLayer, LoggingLayer},
    service::{AggregationService, StatusService},
    storage::{HostRetention, StatusStore, memory::MemoryStore, sled_store::SledStore},
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); flags override its values
    #[arg(short = 'f', long)]
    config: Option<String>,

    /// HTTP listen address
    #[arg(long)]
    http_addr: Option<std::net::SocketAddr>,

    /// Directory containing the snapshot files
    #[arg(long)]
    status_dir: Option<PathBuf>,

    /// Path of the status database
    #[arg(long)]
    local_db: Option<PathBuf>,

    /// Seconds to keep query results cached
    #[arg(long)]
    cache_expiration: Option<u64>,

    /// Minimum seconds between processed refresh requests
    #[arg(long)]
    refresh_interval: Option<u64>,

    /// Suffix of snapshot files
    #[arg(long)]
    suffix: Option<String>,

    /// Append records of hosts reported by several snapshots instead of replacing them
    #[arg(long)]
    append_duplicate_hosts: bool,

    /// Delete stored hosts that no snapshot reports anymore
    #[arg(long)]
    prune_missing_hosts: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => read_config_file(path)?,
            None => Config::default(),
        };

        if let Some(http_addr) = self.http_addr {
            config.http_addr = http_addr;
        }
        if let Some(status_dir) = self.status_dir {
            config.status_dir = status_dir;
        }
        if let Some(path) = self.local_db {
            config.storage = StorageConfig::Sled { path };
        }
        if let Some(cache_expiration) = self.cache_expiration {
            config.cache_expiration = cache_expiration;
        }
        if let Some(refresh_interval) = self.refresh_interval {
            config.refresh_interval = refresh_interval;
        }
        if let Some(suffix) = self.suffix {
            config.suffix = suffix;
        }
        if self.append_duplicate_hosts {
            config.merge = MergePolicy::Append;
        }
        if self.prune_missing_hosts {
            config.retention = HostRetention::Prune;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("nagios_aggregator", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn StatusStore>> {
    let store: Arc<dyn StatusStore> = match config {
        StorageConfig::None => {
            info!("using in-memory status store");
            Arc::new(MemoryStore::new())
        }
        StorageConfig::Sled { path } => Arc::new(SledStore::new(path).await?),
    };
    debug!("{}", store.get_stats().await?);
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = args.into_config()?;
    debug!("effective config: {config:?}");

    let store = open_store(&config.storage).await?;

    let aggregator = FileAggregator::new(&config.status_dir)?
        .with_suffix(config.suffix.clone())
        .with_merge_policy(config.merge);
    let service = AggregationService::with_aggregator(aggregator, Arc::clone(&store))?
        .with_retention(config.retention);

    let registry = prometheus::Registry::new();
    let metrics = ServiceMetrics::register(&registry)?;
    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));

    let service: Arc<dyn StatusService> = Arc::new(
        tower::ServiceBuilder::new()
            .layer(InstrumentingLayer::new(metrics))
            .layer(CachingLayer::new(cache))
            .layer(LoggingLayer)
            .service(service),
    );

    let state = ApiState::new(
        service,
        Arc::clone(&store),
        registry,
        config.refresh_period(),
    )?;
    let api_config = ApiConfig {
        bind_addr: config.http_addr,
    };

    api::serve(api_config, state, shutdown_signal()).await?;

    store.close().await?;
    Ok(())
}
