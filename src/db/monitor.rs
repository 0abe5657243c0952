//! Background pool health monitoring.
//!
//! Samples pool utilization on a fixed interval, independent of caller
//! requests. Above the configured high-water mark it emits a warning and
//! issues a no-op diagnostic query to encourage idle-connection recycling.
//! A failed check is logged and the loop continues on the next tick; the
//! task exits once the pool closes.

use crate::db::pool::DbPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub struct PoolHealthMonitor {
    pool: Arc<DbPool>,
    interval: Duration,
    /// Utilization fraction of the connection limit above which the monitor
    /// intervenes.
    threshold: f64,
}

impl PoolHealthMonitor {
    pub fn new(pool: Arc<DbPool>, interval: Duration, threshold: f64) -> Self {
        Self {
            pool,
            interval,
            threshold,
        }
    }

    /// Spawn the sampling loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; the first real sample comes one
            // interval after startup
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if self.pool.is_closed() {
                    break;
                }
                self.sample().await;
            }
            debug!("Pool health monitor stopped");
        })
    }

    async fn sample(&self) {
        let status = self.pool.status();
        let high = f64::from(status.active) > self.threshold * f64::from(status.configured_limit);
        if high {
            warn!(
                active = status.active,
                idle = status.idle,
                limit = status.configured_limit,
                "Connection pool utilization high, issuing recycle probe"
            );
            if let Err(e) = self.pool.ping().await {
                warn!(error = %e, "Pool health probe failed");
            }
        } else {
            debug!(
                active = status.active,
                idle = status.idle,
                total = status.total,
                "Pool health check"
            );
        }
    }
}
