//! Decorators around [`StatusService`](crate::service::StatusService)
//!
//! Every middleware wraps the next link of the chain and is itself a
//! `StatusService`, so the chain is plain composition chosen by the caller.
//! Each middleware also comes with a [`tower::Layer`], which lets a chain be
//! assembled with [`tower::ServiceBuilder`]; the first layer added is the
//! outermost one:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use nagios_aggregator::{cache::ResponseCache, metrics::ServiceMetrics};
//! # use nagios_aggregator::middleware::*;
//! # use nagios_aggregator::service::{AggregationService, StatusService};
//! # use nagios_aggregator::storage::memory::MemoryStore;
//! # fn build() -> anyhow::Result<()> {
//! let service = AggregationService::new("statuses", Arc::new(MemoryStore::new()))?;
//! let metrics = ServiceMetrics::register(prometheus::default_registry())?;
//! let cache = Arc::new(ResponseCache::default());
//!
//! let service = tower::ServiceBuilder::new()
//!     .layer(InstrumentingLayer::new(metrics))
//!     .layer(CachingLayer::new(cache))
//!     .layer(LoggingLayer)
//!     .service(service);
//! # Ok(())
//! # }
//! ```
//!
//! Ordering decides what each layer observes. With caching outside of
//! instrumenting, cache hits never reach the collectors; with caching
//! inside, every call is counted.

pub mod caching;
pub mod instrumenting;
pub mod logging;

pub use caching::{CACHE_KEY, CachingLayer, CachingMiddleware};
pub use instrumenting::{InstrumentingLayer, InstrumentingMiddleware};
pub use logging::{LoggingLayer, LoggingMiddleware};

/// Operation names used in log events and metric labels
pub mod method {
    pub const GET: &str = "get";
    pub const REFRESH: &str = "refresh";
}
