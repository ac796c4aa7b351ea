use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::error::{Result, StatsError};

/// Half-open range of calendar days, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct DateInterval {
    start: NaiveDate,
    end: NaiveDate,
}

/// Wire form of [`DateInterval`], validated through [`DateInterval::new`].
#[derive(Deserialize)]
struct IntervalBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<IntervalBounds> for DateInterval {
    type Error = StatsError;

    fn try_from(bounds: IntervalBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(StatsError::MalformedInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// The seven days of the week containing `date`.
    pub fn week_containing(date: NaiveDate, first_weekday: Weekday) -> Self {
        let start = start_of_week(date, first_weekday);
        Self {
            start,
            end: start + Days::new(7),
        }
    }

    pub fn month_containing(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.day0()));
        Self {
            start,
            end: start + Months::new(1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the interval.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Day offset of `date` from the start, when inside the interval.
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| (date - self.start).num_days() as usize)
    }

    pub fn days(self) -> impl DoubleEndedIterator<Item = NaiveDate> + ExactSizeIterator {
        let start = self.start;
        (0..self.len_days()).map(move |i| start + Days::new(i as u64))
    }

    /// Extends the interval to whole calendar weeks: back to the week start
    /// containing `start`, forward to the first week boundary at or after `end`.
    pub fn week_aligned(&self, first_weekday: Weekday) -> Self {
        let start = start_of_week(self.start, first_weekday);
        let end = start_of_week(self.last_day(), first_weekday) + Days::new(7);
        Self { start, end }
    }
}

impl std::fmt::Display for DateInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} – {}", self.start, self.last_day())
    }
}

/// Position of `date` within its week, 0 being `first_weekday`.
pub fn weekday_slot(date: NaiveDate, first_weekday: Weekday) -> usize {
    let day = date.weekday().num_days_from_monday();
    let first = first_weekday.num_days_from_monday();
    ((day + 7 - first) % 7) as usize
}

pub fn start_of_week(date: NaiveDate, first_weekday: Weekday) -> NaiveDate {
    date - Days::new(weekday_slot(date, first_weekday) as u64)
}

/// Weekdays in display order for the configured first day of the week.
pub fn weekday_symbols(first_weekday: Weekday) -> [Weekday; 7] {
    let mut days = [first_weekday; 7];
    for i in 1..7 {
        days[i] = days[i - 1].succ();
    }
    days
}
