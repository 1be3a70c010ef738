use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use super::{FeedFailure, Marketplace, RefreshReport};
use crate::availability::{AvailabilityChange, AvailabilityWindow, DateSpan, available_dates};
use crate::booking::Booking;
use crate::error::StaybookResult;
use crate::event::FeedEvent;
use crate::feed::normalize_feed_url;
use crate::ics::{generate_booking_calendar, parse_feed};
use crate::property::Property;

impl Marketplace {
    /// Refetch every feed of a property and recompute its bookable dates.
    /// A feed that fails keeps the spans it had before.
    pub async fn refresh_property(&self, property_id: &str) -> StaybookResult<RefreshReport> {
        let property: Property = self.store.fetch(property_id).await?;
        let (fetched, feed_errors) = self.fetch_feeds(&property).await?;

        let _guard = self.locks.acquire(property_id).await;
        // Re-read: the property may have changed while the feeds downloaded.
        let mut current: Property = self.store.fetch(property_id).await?;
        // Spans read for an older window or zone would be wrong; the update
        // that moved them already reread the feeds.
        if current.feed_frame() == property.feed_frame() {
            for (url, spans) in fetched {
                if current.ical_urls.contains(&url) {
                    current.external_busy.insert(url, spans);
                }
            }
        }
        let mut property = current;
        let urls = property.ical_urls.clone();
        property.external_busy.retain(|url, _| urls.contains(url));

        let refreshed_at = Utc::now();
        property.last_refreshed_at = Some(refreshed_at);
        let old = self.store_available_dates(&mut property).await?;
        let change = AvailabilityChange::between(&old, &property.available_dates);

        info!(
            property = %property.id,
            old = old.len(),
            new = property.available_dates.len(),
            added = change.added.len(),
            removed = change.removed.len(),
            failed_feeds = feed_errors.len(),
            "availability refreshed"
        );

        Ok(RefreshReport {
            property_id: property.id,
            old_count: old.len(),
            new_count: property.available_dates.len(),
            added: change.added,
            removed: change.removed,
            feed_errors,
            refreshed_at,
        })
    }

    /// Refresh every property. One property failing doesn't stop the rest.
    pub async fn refresh_all(&self) -> StaybookResult<Vec<RefreshReport>> {
        let properties = self.store.list::<Property>().await?;
        let mut reports = Vec::with_capacity(properties.len());

        for property in properties {
            match self.refresh_property(&property.id).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!(property = %property.id, "refresh failed: {e}"),
            }
        }

        Ok(reports)
    }

    /// Bookable dates of a property, optionally narrowed to `from..=to`.
    /// Computed from the cached feed spans and current bookings.
    pub async fn available_dates(
        &self,
        property_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StaybookResult<Vec<NaiveDate>> {
        let property: Property = self.store.fetch(property_id).await?;
        let Some(window) = property.window()?.clip(from, to) else {
            return Ok(Vec::new());
        };
        let busy = self.busy_spans(&property).await?;
        Ok(available_dates(&window, &property.closed_days, &busy))
    }

    /// Bookings of a property ordered by check-in.
    pub async fn bookings_for_property(&self, property_id: &str) -> StaybookResult<Vec<Booking>> {
        self.store.fetch::<Property>(property_id).await?;
        let mut bookings: Vec<Booking> = self
            .store
            .list::<Booking>()
            .await?
            .into_iter()
            .filter(|b| b.property_id == property_id)
            .collect();
        bookings.sort_by(|a, b| (a.start_date, &a.id).cmp(&(b.start_date, &b.id)));
        Ok(bookings)
    }

    /// iCal export of the property's active bookings.
    pub async fn export_calendar(&self, property_id: &str) -> StaybookResult<String> {
        let property: Property = self.store.fetch(property_id).await?;
        let bookings = self.holding_bookings(property_id).await?;
        Ok(generate_booking_calendar(&property.title, &bookings))
    }

    /// Fetch and parse a feed without storing anything.
    pub async fn preview_feed(&self, url: &str) -> StaybookResult<Vec<FeedEvent>> {
        normalize_feed_url(url)?;
        let body = self.feeds.fetch(url).await?;
        parse_feed(&body)
    }

    /// Read every feed of `property` against its current window and zone.
    /// Failures are returned alongside the spans that did load.
    pub(super) async fn fetch_feeds(
        &self,
        property: &Property,
    ) -> StaybookResult<(BTreeMap<String, Vec<DateSpan>>, Vec<FeedFailure>)> {
        let window = property.window()?;
        let tz = property.tz()?;

        let mut fetched = BTreeMap::new();
        let mut feed_errors = Vec::new();
        for url in &property.ical_urls {
            match self.read_feed(url, &window, tz).await {
                Ok(spans) => {
                    debug!(property = %property.id, %url, spans = spans.len(), "feed read");
                    fetched.insert(url.clone(), spans);
                }
                Err(e) => {
                    warn!(property = %property.id, %url, "keeping cached spans: {e}");
                    feed_errors.push(FeedFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok((fetched, feed_errors))
    }

    async fn read_feed(
        &self,
        url: &str,
        window: &AvailabilityWindow,
        tz: Tz,
    ) -> StaybookResult<Vec<DateSpan>> {
        let body = self.feeds.fetch(url).await?;
        let events = parse_feed(&body)?;

        let mut spans = Vec::new();
        for event in &events {
            match event.spans_within(window, tz) {
                Ok(found) => spans.extend(found),
                Err(e) => warn!(%url, uid = ?event.uid, "skipping event: {e}"),
            }
        }
        Ok(spans)
    }
}
