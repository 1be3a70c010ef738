//! Background jobs: periodic feed refresh and hold expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use staybook_core::Marketplace;

/// How often unpaid holds are checked for expiry.
pub const EXPIRY_SWEEP: Duration = Duration::from_secs(60);

/// Refetch every property's feeds each `every`, starting immediately.
pub fn spawn_refresh(
    market: Arc<Marketplace>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match market.refresh_all().await {
                        Ok(reports) => tracing::info!(properties = reports.len(), "scheduled refresh done"),
                        Err(e) => tracing::warn!("scheduled refresh failed: {e}"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("refresh task stopped");
    })
}

/// Cancel holds past their TTL every `every`.
pub fn spawn_expiry(
    market: Arc<Marketplace>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = market.expire_pending_bookings(Utc::now()).await {
                        tracing::warn!("hold expiry failed: {e}");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("expiry task stopped");
    })
}
