use chrono::NaiveDate;
use log::trace;

use super::interval::DateInterval;
use crate::models::DayResult;

/// Completion counts of one habit laid out densely over an interval, one slot
/// per day. Days without a result hold zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionIndex {
    interval: DateInterval,
    counts: Vec<u32>,
}

impl CompletionIndex {
    /// Results dated outside `interval` are ignored. For week-aligned
    /// intervals a slot is the weekday position relative to the first weekday.
    pub fn build(interval: DateInterval, results: &[DayResult]) -> Self {
        let mut counts = vec![0; interval.len_days()];
        for result in results {
            match interval.offset_of(result.date) {
                Some(slot) => counts[slot] = result.completion_count.get(),
                None => trace!("result on {} falls outside {}", result.date, interval),
            }
        }
        Self { interval, counts }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn count_on(&self, date: NaiveDate) -> u32 {
        self.interval
            .offset_of(date)
            .map_or(0, |slot| self.counts[slot])
    }

    /// Completions recorded on `today`; zero when today is outside the interval.
    pub fn today_count(&self, today: NaiveDate) -> u32 {
        self.count_on(today)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}
