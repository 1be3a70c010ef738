//! Guest bookings and their lifecycle.
//!
//! ```text
//! pending_payment ──► confirmed ──► cancelled
//!        │                             ▲
//!        └─────────────────────────────┘
//! ```
//!
//! A hold cancelled by the expiry sweep is marked `lapsed`; a payment that
//! arrives for it afterwards may still confirm it.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::DateSpan;
use crate::error::{StaybookError, StaybookResult};
use crate::pricing::Pricing;
use crate::store::{Document, new_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl GuestInfo {
    pub fn validate(&self) -> StaybookResult<()> {
        if self.name.trim().is_empty() {
            return Err(StaybookError::Validation("guest name is required".into()));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(StaybookError::Validation(format!(
                "invalid guest email '{email}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Active bookings hold their nights.
    pub fn is_active(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a booking came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    #[default]
    Guest,
    Invoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub guest: GuestInfo,
    pub guests: u32,
    /// Check-in day.
    pub start_date: NaiveDate,
    /// Check-out day; not a night of the stay.
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub pricing: Pricing,
    #[serde(default)]
    pub checkout_session_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub source: BookingSource,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// Cancelled because the hold ran past its TTL unpaid.
    #[serde(default)]
    pub lapsed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Booking {
    const COLLECTION: &'static str = "bookings";
    const KIND: &'static str = "Booking";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Booking {
    /// A new hold awaiting payment.
    pub fn new(
        property_id: String,
        guest: GuestInfo,
        guests: u32,
        stay: DateSpan,
        pricing: Pricing,
        source: BookingSource,
    ) -> Self {
        let now = Utc::now();
        Booking {
            id: new_id(),
            property_id,
            guest,
            guests,
            start_date: stay.start,
            end_date: stay.end,
            status: BookingStatus::PendingPayment,
            pricing,
            checkout_session_id: None,
            invoice_id: None,
            source,
            cancel_reason: None,
            lapsed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn span(&self) -> DateSpan {
        DateSpan::new(self.start_date, self.end_date)
    }

    pub fn confirm(&mut self) -> StaybookResult<()> {
        match self.status {
            BookingStatus::PendingPayment => {
                self.status = BookingStatus::Confirmed;
                self.updated_at = Utc::now();
                Ok(())
            }
            BookingStatus::Confirmed => Ok(()),
            BookingStatus::Cancelled => Err(self.transition_error(BookingStatus::Confirmed)),
        }
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> StaybookResult<()> {
        if self.status == BookingStatus::Cancelled {
            return Err(self.transition_error(BookingStatus::Cancelled));
        }
        self.status = BookingStatus::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancel an unpaid hold that ran past its TTL.
    pub fn lapse(&mut self) -> StaybookResult<()> {
        if self.status != BookingStatus::PendingPayment {
            return Err(self.transition_error(BookingStatus::Cancelled));
        }
        self.cancel("hold expired")?;
        self.lapsed = true;
        Ok(())
    }

    /// Confirm a lapsed hold whose payment arrived late. Any other booking
    /// goes through [`Booking::confirm`].
    pub fn revive(&mut self) -> StaybookResult<()> {
        if !self.lapsed || self.status != BookingStatus::Cancelled {
            return self.confirm();
        }
        self.status = BookingStatus::Confirmed;
        self.cancel_reason = None;
        self.lapsed = false;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// A hold that has waited longer than `ttl` for payment.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.status != BookingStatus::PendingPayment {
            return false;
        }
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.created_at >= ttl,
            Err(_) => false,
        }
    }

    fn transition_error(&self, to: BookingStatus) -> StaybookError {
        StaybookError::InvalidTransition {
            kind: Self::KIND,
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
