//! Events read from external iCal feeds.
//!
//! Only the parts of a VEVENT that matter for availability are kept: when it
//! starts and ends, whether it blocks time, and how it repeats.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityWindow, DateSpan};
use crate::error::StaybookResult;
use crate::recurrence::expand_occurrences;

/// An event from an external calendar feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub status: EventStatus,
    pub transparency: Transparency,
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// Whether the event occupies time (OPAQUE) or shows as free (TRANSPARENT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transparency {
    Opaque,
    Transparent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

impl EventTime {
    /// Calendar date of this time as seen in `tz`.
    ///
    /// Floating times and all-day dates have no zone and are taken as-is.
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTimeUtc(dt) => dt.with_timezone(&tz).date_naive(),
            EventTime::DateTimeFloating(dt) => dt.date(),
            EventTime::DateTimeZoned { datetime, tzid } => tzid
                .parse::<Tz>()
                .ok()
                .and_then(|src| src.from_local_datetime(datetime).earliest())
                .map(|dt| dt.with_timezone(&tz).date_naive())
                .unwrap_or_else(|| datetime.date()),
        }
    }

    /// Same variant, moved by `delta`.
    pub fn shifted(&self, delta: Duration) -> EventTime {
        match self {
            EventTime::Date(d) => EventTime::Date(*d + Duration::days(delta.num_days())),
            EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(*dt + delta),
            EventTime::DateTimeFloating(dt) => EventTime::DateTimeFloating(*dt + delta),
            EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
                datetime: *datetime + delta,
                tzid: tzid.clone(),
            },
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} {}", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}

impl FeedEvent {
    /// Cancelled and transparent events leave the property free.
    pub fn blocks(&self) -> bool {
        self.status != EventStatus::Cancelled && self.transparency == Transparency::Opaque
    }

    /// Dates this event occupies in `tz`, check-out day excluded.
    pub fn span(&self, tz: Tz) -> DateSpan {
        DateSpan::new(self.start.local_date(tz), self.end.local_date(tz))
    }

    /// Busy spans of this event (and its repetitions) that touch `window`.
    pub fn spans_within(&self, window: &AvailabilityWindow, tz: Tz) -> StaybookResult<Vec<DateSpan>> {
        if !self.blocks() {
            return Ok(Vec::new());
        }

        let bounds = window.as_span();
        let spans = match self.recurrence {
            Some(_) => {
                let length = self.span(tz).num_nights();
                expand_occurrences(self, window, length)?
                    .into_iter()
                    .map(|start| {
                        let first = start.local_date(tz);
                        DateSpan::new(first, first + Duration::days(length))
                    })
                    .collect()
            }
            None => vec![self.span(tz)],
        };

        Ok(spans.into_iter().filter(|s| s.overlaps(&bounds)).collect())
    }
}

impl fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} → {})",
            self.summary.as_deref().unwrap_or("(no title)"),
            self.start,
            self.end
        )
    }
}
