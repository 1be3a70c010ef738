//! Checkout sessions and the gateway that opens them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::error::{StaybookError, StaybookResult};
use crate::store::{Document, Store, new_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Paid,
    Failed,
    Expired,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Open => "open",
            SessionStatus::Paid => "paid",
            SessionStatus::Failed => "failed",
            SessionStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub booking_id: String,
    pub property_id: String,
    pub amount: i64,
    pub currency: String,
    pub payment_url: String,
    pub status: SessionStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Document for CheckoutSession {
    const COLLECTION: &'static str = "checkout_sessions";
    const KIND: &'static str = "Checkout session";

    fn id(&self) -> &str {
        &self.id
    }
}

impl CheckoutSession {
    /// Close an open session with `to`. Repeating the same outcome is a no-op.
    pub fn close(&mut self, to: SessionStatus) -> StaybookResult<()> {
        match self.status {
            SessionStatus::Open => {
                self.status = to;
                Ok(())
            }
            current if current == to => Ok(()),
            current => Err(StaybookError::InvalidTransition {
                kind: Self::KIND,
                from: current.to_string(),
                to: to.to_string(),
            }),
        }
    }

    /// Record a payment captured after the session was expired.
    pub fn settle_late(&mut self) -> StaybookResult<()> {
        if self.status == SessionStatus::Expired {
            self.status = SessionStatus::Paid;
            return Ok(());
        }
        self.close(SessionStatus::Paid)
    }
}

/// Opens checkout sessions for bookings awaiting payment.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn open_session(&self, booking: &Booking, ttl: Duration) -> StaybookResult<CheckoutSession>;
}

/// Gateway that records sessions in the store and points guests at
/// `{base_url}/payment/{session_id}`. Payment outcomes arrive via webhook.
pub struct LocalGateway {
    store: Store,
    base_url: String,
}

impl LocalGateway {
    pub fn new(store: Store, base_url: impl Into<String>) -> Self {
        LocalGateway {
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for LocalGateway {
    async fn open_session(&self, booking: &Booking, ttl: Duration) -> StaybookResult<CheckoutSession> {
        if booking.pricing.total <= 0 {
            return Err(StaybookError::Payment(format!(
                "booking {} has nothing to pay",
                booking.id
            )));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StaybookError::Payment(format!("invalid hold ttl: {e}")))?;

        let id = new_id();
        let now = Utc::now();
        let session = CheckoutSession {
            payment_url: format!("{}/payment/{id}", self.base_url),
            id,
            booking_id: booking.id.clone(),
            property_id: booking.property_id.clone(),
            amount: booking.pricing.total,
            currency: booking.pricing.currency.clone(),
            status: SessionStatus::Open,
            start_date: booking.start_date,
            end_date: booking.end_date,
            created_at: now,
            expires_at: now + ttl,
        };
        self.store.put(&session).await?;
        Ok(session)
    }
}
