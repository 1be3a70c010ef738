//! iCal feed parsing and booking-calendar generation (RFC 5545).

mod generate;
mod parse;

pub use generate::generate_booking_calendar;
pub use parse::parse_feed;
