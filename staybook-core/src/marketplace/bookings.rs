use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{BookingReceipt, Marketplace};
use crate::availability::{DateSpan, first_conflict};
use crate::booking::{Booking, BookingSource, BookingStatus, GuestInfo};
use crate::error::{StaybookError, StaybookResult};
use crate::payment::{CheckoutSession, SessionStatus};
use crate::property::Property;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub property_id: String,
    pub guest: GuestInfo,
    #[serde(default = "one_guest")]
    pub guests: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn one_guest() -> u32 {
    1
}

impl Marketplace {
    /// Place a hold on the requested nights and open a checkout session.
    pub async fn create_booking(&self, request: BookingRequest) -> StaybookResult<BookingReceipt> {
        let stay = DateSpan::stay(request.start_date, request.end_date)?;
        request.guest.validate()?;
        if request.guests == 0 {
            return Err(StaybookError::Validation("at least one guest is required".into()));
        }

        let booking = {
            let _guard = self.locks.acquire(&request.property_id).await;
            let mut property: Property = self.store.fetch(&request.property_id).await?;
            if !property.is_published() {
                return Err(StaybookError::Validation(format!(
                    "property {} is not open for booking",
                    property.id
                )));
            }
            if request.guests > property.max_guests {
                return Err(StaybookError::Validation(format!(
                    "property {} sleeps at most {} guests",
                    property.id, property.max_guests
                )));
            }

            let busy = self.busy_spans(&property).await?;
            if let Some(night) =
                first_conflict(&property.window()?, &property.closed_days, &busy, &stay)
            {
                return Err(StaybookError::Conflict(format!(
                    "{night} is not available at property {}",
                    property.id
                )));
            }

            let pricing = property
                .rate_card(self.booking.default_cleaning_fee)
                .quote(&stay, &self.booking.currency);
            let booking = Booking::new(
                property.id.clone(),
                request.guest,
                request.guests,
                stay,
                pricing,
                BookingSource::Guest,
            );
            self.store.put(&booking).await?;
            self.store_available_dates(&mut property).await?;
            booking
        };

        match self.gateway.open_session(&booking, self.booking.hold_ttl).await {
            Ok(session) => {
                let mut booking = booking;
                booking.checkout_session_id = Some(session.id.clone());
                self.store.put(&booking).await?;
                info!(
                    booking = %booking.id,
                    property = %booking.property_id,
                    nights = stay.num_nights(),
                    total = booking.pricing.total,
                    "hold placed"
                );
                Ok(BookingReceipt { booking, session })
            }
            Err(e) => {
                warn!(booking = %booking.id, "checkout failed, releasing hold: {e}");
                let mut booking = booking;
                booking.cancel("checkout session could not be opened")?;
                self.store.put(&booking).await?;
                self.sync_available_dates(&booking.property_id).await?;
                Err(e)
            }
        }
    }

    pub async fn booking(&self, id: &str) -> StaybookResult<Booking> {
        self.store.fetch(id).await
    }

    pub async fn checkout_session(&self, id: &str) -> StaybookResult<CheckoutSession> {
        self.store.fetch(id).await
    }

    /// Payment succeeded: the hold becomes a confirmed booking.
    pub async fn confirm_payment(&self, session_id: &str) -> StaybookResult<Booking> {
        let session: CheckoutSession = self.store.fetch(session_id).await?;
        let _guard = self.locks.acquire(&session.property_id).await;

        let mut session: CheckoutSession = self.store.fetch(session_id).await?;
        let mut booking: Booking = self.store.fetch(&session.booking_id).await?;
        if booking.lapsed || booking.is_expired(Utc::now(), self.booking.hold_ttl) {
            // The hold lapsed before payment arrived; its nights may be gone.
            let property: Property = self.store.fetch(&booking.property_id).await?;
            let busy = self.busy_spans(&property).await?;
            if busy.iter().any(|span| span.overlaps(&booking.span())) {
                return Err(StaybookError::Conflict(format!(
                    "hold {} expired and its nights were taken",
                    booking.id
                )));
            }
        }
        if booking.lapsed {
            booking.revive()?;
            session.settle_late()?;
            info!(booking = %booking.id, "lapsed hold revived by late payment");
        } else {
            booking.confirm()?;
            session.close(SessionStatus::Paid)?;
        }

        self.store.put(&session).await?;
        self.store.put(&booking).await?;
        self.refresh_cached(&booking.property_id).await?;
        info!(booking = %booking.id, session = %session.id, "payment confirmed");
        Ok(booking)
    }

    /// Payment failed or the session lapsed: release the hold.
    pub async fn fail_payment(&self, session_id: &str) -> StaybookResult<Booking> {
        let session: CheckoutSession = self.store.fetch(session_id).await?;
        let _guard = self.locks.acquire(&session.property_id).await;

        let mut session: CheckoutSession = self.store.fetch(session_id).await?;
        let mut booking: Booking = self.store.fetch(&session.booking_id).await?;
        session.close(SessionStatus::Failed)?;
        if booking.status == BookingStatus::PendingPayment {
            booking.cancel("payment failed")?;
        }

        self.store.put(&session).await?;
        self.store.put(&booking).await?;
        self.refresh_cached(&booking.property_id).await?;
        info!(booking = %booking.id, session = %session.id, "payment failed");
        Ok(booking)
    }

    pub async fn cancel_booking(&self, id: &str, reason: &str) -> StaybookResult<Booking> {
        let booking: Booking = self.store.fetch(id).await?;
        let _guard = self.locks.acquire(&booking.property_id).await;

        let mut booking: Booking = self.store.fetch(id).await?;
        booking.cancel(reason)?;
        self.store.put(&booking).await?;
        self.close_open_session(&booking, SessionStatus::Expired).await?;
        self.refresh_cached(&booking.property_id).await?;

        info!(booking = %booking.id, reason, "booking cancelled");
        Ok(booking)
    }

    /// Cancel holds that waited longer than the hold TTL. Returns their ids.
    pub async fn expire_pending_bookings(&self, now: DateTime<Utc>) -> StaybookResult<Vec<String>> {
        let ttl = self.booking.hold_ttl;
        let stale: Vec<Booking> = self
            .store
            .list::<Booking>()
            .await?
            .into_iter()
            .filter(|b| b.is_expired(now, ttl))
            .collect();

        let mut expired = Vec::new();
        for candidate in stale {
            let _guard = self.locks.acquire(&candidate.property_id).await;
            let mut booking: Booking = match self.store.get(&candidate.id).await? {
                Some(b) => b,
                None => continue,
            };
            if !booking.is_expired(now, ttl) {
                continue;
            }

            booking.lapse()?;
            self.store.put(&booking).await?;
            self.close_open_session(&booking, SessionStatus::Expired).await?;
            self.refresh_cached(&booking.property_id).await?;
            debug!(booking = %booking.id, "hold expired");
            expired.push(booking.id);
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "expired unpaid holds");
        }
        Ok(expired)
    }

    async fn close_open_session(&self, booking: &Booking, to: SessionStatus) -> StaybookResult<()> {
        let Some(session_id) = &booking.checkout_session_id else {
            return Ok(());
        };
        if let Some(mut session) = self.store.get::<CheckoutSession>(session_id).await?
            && session.status == SessionStatus::Open
        {
            session.close(to)?;
            self.store.put(&session).await?;
        }
        Ok(())
    }
}
