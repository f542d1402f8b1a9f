//! Caching middleware
//!
//! `get` is answered from a single cache slot while it is fresh; a miss
//! goes inwards and only a successful result is stored. `refresh` always
//! clears the slot after the inner call returned, whatever its outcome, so
//! the next `get` observes the refreshed data. A `get` that was already
//! running inwards when the slot was cleared does not store its result.

use std::sync::Arc;

use async_trait::async_trait;
use tower::Layer;
use tracing::trace;

use crate::HostStatusMap;
use crate::cache::ResponseCache;
use crate::service::{ServiceResult, StatusService};

/// Key of the single cached query response
pub const CACHE_KEY: &str = "nagios";

pub struct CachingMiddleware<S> {
    cache: Arc<ResponseCache<HostStatusMap>>,
    next: S,
}

impl<S> CachingMiddleware<S> {
    pub fn new(cache: Arc<ResponseCache<HostStatusMap>>, next: S) -> Self {
        Self { cache, next }
    }
}

#[async_trait]
impl<S: StatusService> StatusService for CachingMiddleware<S> {
    async fn refresh(&self) -> ServiceResult<()> {
        let result = self.next.refresh().await;
        self.cache.delete(CACHE_KEY).await;
        trace!("invalidated cached status data");
        result
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        let generation = self.cache.generation().await;
        if let Some(hosts) = self.cache.get(CACHE_KEY).await {
            trace!("serving status data from cache");
            return Ok(hosts);
        }

        let hosts = self.next.get().await?;
        self.cache
            .set_if_current(CACHE_KEY, hosts.clone(), generation)
            .await;
        Ok(hosts)
    }
}

/// [`Layer`] producing a [`CachingMiddleware`] around a shared cache
#[derive(Clone)]
pub struct CachingLayer {
    cache: Arc<ResponseCache<HostStatusMap>>,
}

impl CachingLayer {
    pub fn new(cache: Arc<ResponseCache<HostStatusMap>>) -> Self {
        Self { cache }
    }
}

impl<S> Layer<S> for CachingLayer {
    type Service = CachingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CachingMiddleware::new(Arc::clone(&self.cache), inner)
    }
}
