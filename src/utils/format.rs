use anyhow::{Context, Result};
use chrono::{NaiveDate, Weekday};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{DayProgress, ProgressEntry};

/// Parse a "YYYY-MM-DD" argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Two-letter weekday header
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

/// One glyph per day: ● completed, ◑ partial, ○ nothing, · outside the period
pub fn day_glyph(day: &DayProgress) -> &'static str {
    if !day.in_period {
        return "·";
    }
    match day.entry {
        ProgressEntry::Completed { .. } => "●",
        ProgressEntry::Partial { .. } => "◑",
        ProgressEntry::None { .. } => "○",
    }
}

/// Pad or truncate `title` to `width` terminal columns
pub fn fit_title(title: &str, width: usize) -> String {
    if title.width() <= width {
        let padding = width - title.width();
        return format!("{}{}", title, " ".repeat(padding));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in title.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(
            parse_date_arg(" 2024-03-06 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
        );
        assert!(parse_date_arg("06/03/2024").is_err());
    }

    #[test]
    fn test_fit_title_pads_and_truncates() {
        assert_eq!(fit_title("Run", 6), "Run   ");
        assert_eq!(fit_title("Meditation", 6), "Medit…");
        assert_eq!(fit_title("読書する習慣", 6), "読書… ");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 0, 4), "░░░░");
        assert_eq!(progress_bar(1, 2, 4), "██░░");
        assert_eq!(progress_bar(9, 2, 4), "████");
    }

    #[test]
    fn test_padding_glyph() {
        let day = DayProgress {
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            entry: ProgressEntry::Completed { completed: 1, target: 1 },
            in_period: false,
        };
        assert_eq!(day_glyph(&day), "·");
    }
}
