//! Booking calendar export.
//!
//! Lets channel managers (Airbnb, Booking.com, ...) import the nights sold
//! here, the reverse direction of the feeds we parse.

use chrono::{NaiveDate, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::booking::{Booking, BookingStatus};

const PRODID: &str = "-//staybook//bookings//EN";

/// Generate an iCal feed with one all-day event per active booking.
///
/// Guest details stay out of the feed; every event is just "Reserved".
pub fn generate_booking_calendar(name: &str, bookings: &[Booking]) -> String {
    let mut cal = Calendar::new();
    cal.name(name);

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for booking in bookings.iter().filter(|b| b.status.is_active()) {
        let mut event = icalendar::Event::new();
        event.uid(&format!("{}@staybook", booking.id));
        event.summary("Reserved");
        event.add_property("DTSTAMP", &dtstamp);
        add_date_property(&mut event, "DTSTART", booking.start_date);
        add_date_property(&mut event, "DTEND", booking.end_date);

        if booking.status == BookingStatus::PendingPayment {
            event.add_property("STATUS", "TENTATIVE");
        }

        cal.push(event.done());
    }

    strip_ics_bloat(&cal.done().to_string())
}

fn add_date_property(event: &mut icalendar::Event, name: &str, date: NaiveDate) {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    event.append_property(prop);
}

/// Use our PRODID and drop CALSCALE:GREGORIAN (it's the default).
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
