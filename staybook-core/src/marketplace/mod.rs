//! The marketplace service: every operation the server and CLI expose.
//!
//! `Marketplace` owns the document store plus the two outside seams (feed
//! fetching and the payment gateway). Operations that read availability and
//! then write a booking hold the property's lock for the whole sequence.

mod availability;
mod bookings;
mod records;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{DateSpan, available_dates};
use crate::booking::Booking;
use crate::config::{BookingConfig, StaybookConfig};
use crate::error::StaybookResult;
use crate::feed::{FeedFetcher, HttpFeedFetcher};
use crate::locks::PropertyLocks;
use crate::payment::{CheckoutSession, LocalGateway, PaymentGateway};
use crate::property::Property;
use crate::store::Store;

pub use bookings::BookingRequest;

pub struct Marketplace {
    store: Store,
    feeds: Arc<dyn FeedFetcher>,
    gateway: Arc<dyn PaymentGateway>,
    locks: PropertyLocks,
    booking: BookingConfig,
}

/// Outcome of refetching a property's feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub property_id: String,
    pub old_count: usize,
    pub new_count: usize,
    pub added: Vec<NaiveDate>,
    pub removed: Vec<NaiveDate>,
    /// Feeds that could not be read; their previous spans were kept.
    pub feed_errors: Vec<FeedFailure>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFailure {
    pub url: String,
    pub error: String,
}

/// A new hold and the checkout session the guest pays through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub session: CheckoutSession,
}

impl Marketplace {
    pub fn new(
        store: Store,
        feeds: Arc<dyn FeedFetcher>,
        gateway: Arc<dyn PaymentGateway>,
        booking: BookingConfig,
    ) -> Self {
        Marketplace {
            store,
            feeds,
            gateway,
            locks: PropertyLocks::new(),
            booking,
        }
    }

    /// File store under the data directory, HTTP feeds, local checkout.
    pub async fn from_config(config: &StaybookConfig) -> StaybookResult<Self> {
        let store = Store::open(&config.data_path()).await?;
        let feeds = HttpFeedFetcher::new(config.availability.fetch_timeout)?;
        let gateway = LocalGateway::new(store.clone(), config.payments.base_url.clone());

        Ok(Marketplace::new(
            store,
            Arc::new(feeds),
            Arc::new(gateway),
            config.booking.clone(),
        ))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn booking_config(&self) -> &BookingConfig {
        &self.booking
    }

    /// Active bookings of a property, holds past their TTL excluded.
    async fn holding_bookings(&self, property_id: &str) -> StaybookResult<Vec<Booking>> {
        let now = Utc::now();
        Ok(self
            .store
            .list::<Booking>()
            .await?
            .into_iter()
            .filter(|b| b.property_id == property_id && b.status.is_active())
            .filter(|b| !b.is_expired(now, self.booking.hold_ttl))
            .collect())
    }

    /// Everything that makes a night of `property` unbookable.
    async fn busy_spans(&self, property: &Property) -> StaybookResult<Vec<DateSpan>> {
        let mut busy = property.external_spans();
        busy.extend(
            self.holding_bookings(&property.id)
                .await?
                .iter()
                .map(Booking::span),
        );
        Ok(busy)
    }

    /// Recompute and store `available_dates`. Returns the previous list.
    /// Callers hold the property lock.
    async fn store_available_dates(&self, property: &mut Property) -> StaybookResult<Vec<NaiveDate>> {
        let busy = self.busy_spans(property).await?;
        let dates = available_dates(&property.window()?, &property.closed_days, &busy);
        let old = std::mem::replace(&mut property.available_dates, dates);
        self.store.put(&*property).await?;
        Ok(old)
    }

    /// Reload a property under its lock and recompute its dates.
    async fn sync_available_dates(&self, property_id: &str) -> StaybookResult<()> {
        let _guard = self.locks.acquire(property_id).await;
        self.refresh_cached(property_id).await
    }

    /// Recompute the cached dates of a property whose lock is already held.
    async fn refresh_cached(&self, property_id: &str) -> StaybookResult<()> {
        if let Some(mut property) = self.store.get::<Property>(property_id).await? {
            self.store_available_dates(&mut property).await?;
        }
        Ok(())
    }
}
