//! Core types and services for staybook.
//!
//! - `availability`, `event`, `ics`, `recurrence` compute bookable dates from
//!   iCal feeds and bookings
//! - `property`, `booking`, `invoice`, `job`, `party` are the stored records
//! - `marketplace::Marketplace` is the service both binaries drive

pub mod availability;
pub mod booking;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod ics;
pub mod invoice;
pub mod job;
pub mod locks;
pub mod marketplace;
pub mod party;
pub mod payment;
pub mod pricing;
pub mod property;
pub mod recurrence;
pub mod store;

pub use config::StaybookConfig;
pub use error::{StaybookError, StaybookResult};
pub use marketplace::{BookingReceipt, BookingRequest, Marketplace, RefreshReport};
