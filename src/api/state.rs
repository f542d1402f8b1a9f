//! API shared state

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use prometheus::Registry;

use crate::service::StatusService;
use crate::storage::StatusStore;

/// Token bucket guarding the refresh endpoint
pub type RefreshLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Fully decorated status service
    pub service: Arc<dyn StatusService>,

    /// Store behind the service, probed by `/health`
    pub store: Arc<dyn StatusStore>,

    /// One token per refresh interval, no queueing
    pub refresh_limiter: Arc<RefreshLimiter>,

    /// Registry exposed on `/metrics`
    pub registry: Registry,
}

impl ApiState {
    /// Create new API state
    ///
    /// Fails if `refresh_interval` is zero.
    pub fn new(
        service: Arc<dyn StatusService>,
        store: Arc<dyn StatusStore>,
        registry: Registry,
        refresh_interval: Duration,
    ) -> anyhow::Result<Self> {
        let quota = Quota::with_period(refresh_interval)
            .ok_or_else(|| anyhow::anyhow!("refresh interval must not be zero"))?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            service,
            store,
            refresh_limiter: Arc::new(RateLimiter::direct(quota)),
            registry,
        })
    }
}
