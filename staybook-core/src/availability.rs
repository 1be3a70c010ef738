//! Bookable-date computation.
//!
//! A property's bookable dates are the days of its availability window that
//! are neither covered by a busy span (external iCal events or internal
//! bookings) nor on one of its closed weekdays.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{StaybookError, StaybookResult};

/// Half-open date range `[start, end)`. For a stay, `end` is the check-out day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Busy span from an external event. An event that doesn't end after it
    /// starts still blocks its start day.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let end = if end > start {
            end
        } else {
            start.succ_opt().unwrap_or(start)
        };
        DateSpan { start, end }
    }

    /// A guest stay; check-out must be after check-in.
    pub fn stay(check_in: NaiveDate, check_out: NaiveDate) -> StaybookResult<Self> {
        if check_out <= check_in {
            return Err(StaybookError::Validation(format!(
                "check-out {check_out} must be after check-in {check_in}"
            )));
        }
        Ok(DateSpan {
            start: check_in,
            end: check_out,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn overlaps(&self, other: &DateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Every night of the span (the check-out day is not a night).
    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }

    pub fn num_nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Inclusive `from..=to` range a property can be booked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl AvailabilityWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> StaybookResult<Self> {
        if to < from {
            return Err(StaybookError::Validation(format!(
                "availability window ends ({to}) before it starts ({from})"
            )));
        }
        Ok(AvailabilityWindow { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }

    /// The window as a half-open span, for overlap tests against events.
    pub fn as_span(&self) -> DateSpan {
        DateSpan::new(self.from, self.to.succ_opt().unwrap_or(self.to))
    }

    /// Narrow the window to `from..=to`, keeping whichever bound is tighter.
    pub fn clip(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Self> {
        let from = from.map_or(self.from, |f| f.max(self.from));
        let to = to.map_or(self.to, |t| t.min(self.to));
        (from <= to).then_some(AvailabilityWindow { from, to })
    }
}

/// Sort spans and coalesce the ones that overlap or touch.
pub fn merge_spans(spans: &[DateSpan]) -> Vec<DateSpan> {
    let mut sorted = spans.to_vec();
    sorted.sort();

    let mut merged: Vec<DateSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Bookable days of `window`, in order.
pub fn available_dates(
    window: &AvailabilityWindow,
    closed_days: &[Weekday],
    busy: &[DateSpan],
) -> Vec<NaiveDate> {
    let merged = merge_spans(busy);
    let mut cursor = 0;
    let mut dates = Vec::new();

    for day in window.days() {
        while cursor < merged.len() && merged[cursor].end <= day {
            cursor += 1;
        }
        let booked = merged.get(cursor).is_some_and(|span| span.contains(day));
        if !booked && !closed_days.contains(&day.weekday()) {
            dates.push(day);
        }
    }

    dates
}

/// First night of `requested` that can't be booked, if any.
pub fn first_conflict(
    window: &AvailabilityWindow,
    closed_days: &[Weekday],
    busy: &[DateSpan],
    requested: &DateSpan,
) -> Option<NaiveDate> {
    requested.nights().find(|night| {
        !window.contains(*night)
            || closed_days.contains(&night.weekday())
            || busy.iter().any(|span| span.contains(*night))
    })
}

/// Dates gained and lost between two computations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    pub added: Vec<NaiveDate>,
    pub removed: Vec<NaiveDate>,
}

impl AvailabilityChange {
    pub fn between(old: &[NaiveDate], new: &[NaiveDate]) -> Self {
        let old: BTreeSet<_> = old.iter().copied().collect();
        let new: BTreeSet<_> = new.iter().copied().collect();

        AvailabilityChange {
            added: new.difference(&old).copied().collect(),
            removed: old.difference(&new).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn window(from: &str, to: &str) -> AvailabilityWindow {
        AvailabilityWindow::new(d(from), d(to)).unwrap()
    }

    #[test]
    fn checkout_day_stays_available() {
        let busy = [DateSpan::new(d("2025-03-02"), d("2025-03-04"))];
        let dates = available_dates(&window("2025-03-01", "2025-03-05"), &[], &busy);

        assert_eq!(
            dates,
            vec![d("2025-03-01"), d("2025-03-04"), d("2025-03-05")]
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let dates = available_dates(&window("2025-03-01", "2025-03-01"), &[], &[]);
        assert_eq!(dates, vec![d("2025-03-01")]);
    }

    #[test]
    fn closed_weekdays_are_excluded() {
        // 2025-03-03 is a Monday.
        let dates = available_dates(
            &window("2025-03-01", "2025-03-07"),
            &[Weekday::Mon, Weekday::Tue],
            &[],
        );

        assert!(!dates.contains(&d("2025-03-03")));
        assert!(!dates.contains(&d("2025-03-04")));
        assert_eq!(dates.len(), 5);
    }

    #[test]
    fn overlapping_and_unsorted_spans_are_merged() {
        let spans = [
            DateSpan::new(d("2025-03-10"), d("2025-03-12")),
            DateSpan::new(d("2025-03-01"), d("2025-03-03")),
            DateSpan::new(d("2025-03-03"), d("2025-03-05")),
            DateSpan::new(d("2025-03-11"), d("2025-03-15")),
        ];

        assert_eq!(
            merge_spans(&spans),
            vec![
                DateSpan::new(d("2025-03-01"), d("2025-03-05")),
                DateSpan::new(d("2025-03-10"), d("2025-03-15")),
            ]
        );
    }

    #[test]
    fn zero_length_span_blocks_its_start_day() {
        let span = DateSpan::new(d("2025-03-02"), d("2025-03-02"));
        assert!(span.contains(d("2025-03-02")));
        assert_eq!(span.num_nights(), 1);
    }

    #[test]
    fn stay_rejects_checkout_before_checkin() {
        assert!(DateSpan::stay(d("2025-03-02"), d("2025-03-02")).is_err());
        assert!(DateSpan::stay(d("2025-03-02"), d("2025-03-01")).is_err());
    }

    #[test]
    fn first_conflict_reports_earliest_blocked_night() {
        let w = window("2025-03-01", "2025-03-31");
        let busy = [DateSpan::new(d("2025-03-05"), d("2025-03-07"))];

        let free = DateSpan::stay(d("2025-03-01"), d("2025-03-05")).unwrap();
        assert_eq!(first_conflict(&w, &[], &busy, &free), None);

        let clash = DateSpan::stay(d("2025-03-03"), d("2025-03-08")).unwrap();
        assert_eq!(first_conflict(&w, &[], &busy, &clash), Some(d("2025-03-05")));

        let outside = DateSpan::stay(d("2025-03-30"), d("2025-04-02")).unwrap();
        assert_eq!(first_conflict(&w, &[], &busy, &outside), Some(d("2025-04-01")));
    }

    #[test]
    fn window_clip_narrows_and_rejects_disjoint_ranges() {
        let w = window("2025-03-01", "2025-03-31");

        let clipped = w.clip(Some(d("2025-02-01")), Some(d("2025-03-10"))).unwrap();
        assert_eq!(clipped, window("2025-03-01", "2025-03-10"));

        assert!(w.clip(Some(d("2025-04-01")), None).is_none());
    }

    #[test]
    fn change_lists_added_and_removed_dates() {
        let old = [d("2025-03-01"), d("2025-03-02"), d("2025-03-03")];
        let new = [d("2025-03-02"), d("2025-03-03"), d("2025-03-04")];

        let change = AvailabilityChange::between(&old, &new);
        assert_eq!(change.added, vec![d("2025-03-04")]);
        assert_eq!(change.removed, vec![d("2025-03-01")]);
    }
}
