//! Colored terminal rendering for staybook types.

use chrono::{Datelike, NaiveDate};
use owo_colors::OwoColorize;
use staybook_core::RefreshReport;
use staybook_core::event::{EventStatus, FeedEvent, Transparency};
use staybook_core::property::{Property, PropertyStatus};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Property {
    fn render(&self) -> String {
        let status = match self.status {
            PropertyStatus::Published => "published".green().to_string(),
            PropertyStatus::Draft => "draft".yellow().to_string(),
        };
        format!(
            "🏠 {} {} {}",
            self.title.bold(),
            status,
            self.id.dimmed()
        )
    }
}

impl Render for FeedEvent {
    fn render(&self) -> String {
        let line = self.to_string();
        if !self.blocks() {
            let why = match (self.status, self.transparency) {
                (EventStatus::Cancelled, _) => "cancelled",
                (_, Transparency::Transparent) => "free",
                _ => "",
            };
            return format!("  {} {}", line.dimmed(), format!("({why})").dimmed());
        }
        if self.recurrence.is_some() {
            format!("  {} {}", line, "(repeats)".cyan())
        } else {
            format!("  {line}")
        }
    }
}

impl Render for RefreshReport {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "   {} → {} bookable nights",
            self.old_count, self.new_count
        )];
        if !self.added.is_empty() {
            lines.push(format!("   {} {}", "+".green(), compact_dates(&self.added).green()));
        }
        if !self.removed.is_empty() {
            lines.push(format!("   {} {}", "-".red(), compact_dates(&self.removed).red()));
        }
        for failure in &self.feed_errors {
            lines.push(format!(
                "   {} {} {}",
                "!".yellow(),
                failure.url,
                format!("({}, kept cached dates)", failure.error).dimmed()
            ));
        }
        lines.join("\n")
    }
}

/// Runs of consecutive dates as `2025-03-02..04, 2025-03-10`.
pub fn compact_dates(dates: &[NaiveDate]) -> String {
    let mut runs: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    for &date in dates {
        match runs.last_mut() {
            Some((_, end)) if end.succ_opt() == Some(date) => *end = date,
            _ => runs.push((date, date)),
        }
    }

    runs.iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else if start.year() == end.year() && start.month() == end.month() {
                format!("{start}..{:02}", end.day())
            } else {
                format!("{start}..{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn consecutive_dates_collapse() {
        let dates = [
            d("2025-03-02"),
            d("2025-03-03"),
            d("2025-03-04"),
            d("2025-03-10"),
            d("2025-03-31"),
            d("2025-04-01"),
        ];
        assert_eq!(
            compact_dates(&dates),
            "2025-03-02..04, 2025-03-10, 2025-03-31..2025-04-01"
        );
    }
}
