//! RRULE expansion for repeating feed events.
//!
//! Owners sometimes block dates with a weekly "closed" event instead of
//! listing each day; those need expanding before they can be merged.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use rrule::RRuleSet;

use crate::availability::AvailabilityWindow;
use crate::error::{StaybookError, StaybookResult};
use crate::event::{EventTime, FeedEvent, Recurrence};

/// Upper bound on generated occurrences per event. A rule that reaches it
/// inside the window is rejected rather than cut short.
const MAX_OCCURRENCES: u16 = u16::MAX;

/// Build an iCalendar-format RRULE string for the rrule crate parser.
fn build_rrule_string(start: &EventTime, recurrence: &Recurrence) -> String {
    let mut lines = Vec::new();

    // The rrule crate needs a datetime, so all-day dates become midnight UTC
    lines.push(format!("DTSTART{}", ics_time_suffix(start)));
    lines.push(format!("RRULE:{}", recurrence.rrule));

    for exdate in &recurrence.exdates {
        lines.push(format!("EXDATE{}", ics_time_suffix(exdate)));
    }

    lines.join("\n")
}

/// The `;TZID=...:value` / `:value` tail of a DTSTART or EXDATE line.
fn ics_time_suffix(time: &EventTime) -> String {
    match time {
        EventTime::Date(d) => format!(":{}T000000Z", d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!(":{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => format!(":{}Z", dt.format("%Y%m%dT%H%M%S")),
        EventTime::DateTimeZoned { datetime, tzid } => {
            format!(";TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

/// Convert an rrule occurrence back to an EventTime matching the master's variant.
fn occurrence_to_event_time(dt: &DateTime<rrule::Tz>, master_start: &EventTime) -> EventTime {
    match master_start {
        EventTime::Date(_) => EventTime::Date(dt.date_naive()),
        EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EventTime::DateTimeFloating(_) => EventTime::DateTimeFloating(dt.naive_utc()),
        EventTime::DateTimeZoned { tzid, .. } => EventTime::DateTimeZoned {
            datetime: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

/// Start times of every occurrence of `master` that can touch `window`.
///
/// `length_days` is how many days one occurrence lasts, so occurrences that
/// start before the window but run into it are still returned.
pub fn expand_occurrences(
    master: &FeedEvent,
    window: &AvailabilityWindow,
    length_days: i64,
) -> StaybookResult<Vec<EventTime>> {
    let Some(recurrence) = &master.recurrence else {
        return Ok(vec![master.start.clone()]);
    };

    let rrule_str = build_rrule_string(&master.start, recurrence);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        StaybookError::IcsParse(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid.as_deref().unwrap_or("(no uid)"),
            e
        ))
    })?;

    // Pad by a day on each side so zone offsets can't push an occurrence out.
    let range_start = (window.from - Duration::days(length_days.max(1) + 1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let range_end = (window.to + Duration::days(2)).and_time(NaiveTime::MIN).and_utc();

    let tz: rrule::Tz = Utc.into();
    let after = range_start.with_timezone(&tz);
    let before = range_end.with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        return Err(StaybookError::IcsParse(format!(
            "RRULE for event '{}' repeats more than {MAX_OCCURRENCES} times in the window",
            master.uid.as_deref().unwrap_or("(no uid)")
        )));
    }

    Ok(result
        .dates
        .iter()
        .map(|occ| occurrence_to_event_time(occ, &master.start))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStatus, Transparency};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weekly(start: &str, rrule: &str, exdates: Vec<EventTime>) -> FeedEvent {
        FeedEvent {
            uid: Some("weekly@test".to_string()),
            summary: Some("Closed".to_string()),
            start: EventTime::Date(d(start)),
            end: EventTime::Date(d(start) + Duration::days(1)),
            status: EventStatus::Confirmed,
            transparency: Transparency::Opaque,
            recurrence: Some(Recurrence {
                rrule: rrule.to_string(),
                exdates,
            }),
        }
    }

    #[test]
    fn weekly_rule_expands_inside_window() {
        // Mondays in March 2025: 3, 10, 17, 24, 31.
        let master = weekly("2025-01-06", "FREQ=WEEKLY;BYDAY=MO", vec![]);
        let window = AvailabilityWindow::new(d("2025-03-01"), d("2025-03-31")).unwrap();

        let spans = master.spans_within(&window, chrono_tz::UTC).unwrap();
        let starts: Vec<NaiveDate> = spans.iter().map(|s| s.start).collect();
        assert_eq!(
            starts,
            vec![
                d("2025-03-03"),
                d("2025-03-10"),
                d("2025-03-17"),
                d("2025-03-24"),
                d("2025-03-31"),
            ]
        );
    }

    #[test]
    fn exdates_are_skipped() {
        let master = weekly(
            "2025-03-03",
            "FREQ=WEEKLY;COUNT=4",
            vec![EventTime::Date(d("2025-03-10"))],
        );
        let window = AvailabilityWindow::new(d("2025-03-01"), d("2025-03-31")).unwrap();

        let spans = master.spans_within(&window, chrono_tz::UTC).unwrap();
        let starts: Vec<NaiveDate> = spans.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![d("2025-03-03"), d("2025-03-17"), d("2025-03-24")]);
    }

    #[test]
    fn daily_rule_covers_a_multi_year_window() {
        let master = weekly("2025-01-01", "FREQ=DAILY", vec![]);
        let window = AvailabilityWindow::new(d("2025-01-01"), d("2027-12-31")).unwrap();

        let spans = master.spans_within(&window, chrono_tz::UTC).unwrap();
        assert_eq!(spans.len(), 1095);
        assert_eq!(spans.last().map(|s| s.start), Some(d("2027-12-31")));
    }

    #[test]
    fn rule_too_dense_for_the_window_is_rejected() {
        let master = weekly("2025-01-01", "FREQ=HOURLY", vec![]);
        let window = AvailabilityWindow::new(d("2025-01-01"), d("2032-12-31")).unwrap();

        let err = master.spans_within(&window, chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, StaybookError::IcsParse(_)));
    }

    #[test]
    fn malformed_rule_is_a_parse_error() {
        let master = weekly("2025-03-03", "FREQ=SOMETIMES", vec![]);
        let window = AvailabilityWindow::new(d("2025-03-01"), d("2025-03-31")).unwrap();

        let err = expand_occurrences(&master, &window, 1).unwrap_err();
        assert!(matches!(err, StaybookError::IcsParse(_)));
    }
}
