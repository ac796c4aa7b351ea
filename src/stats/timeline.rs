//! Resolution of time-versioned objectives (day targets and week goals).
//!
//! A habit's objective history is a list of records, each effective from its
//! `applicable_from` date until the next record takes over. A record with no
//! date has always been in effect. The record in effect on a date is the last
//! one, in ascending `applicable_from` order, whose date is at or before it.

use chrono::NaiveDate;

use crate::models::{DayTarget, WeekGoal};

pub trait Objective {
    fn applicable_from(&self) -> Option<NaiveDate>;
    fn count(&self) -> u32;
}

impl Objective for DayTarget {
    fn applicable_from(&self) -> Option<NaiveDate> {
        self.applicable_from
    }

    fn count(&self) -> u32 {
        self.count.get()
    }
}

impl Objective for WeekGoal {
    fn applicable_from(&self) -> Option<NaiveDate> {
        self.applicable_from
    }

    fn count(&self) -> u32 {
        self.count
    }
}

fn applies_on<T: Objective>(record: &T, date: NaiveDate) -> bool {
    record.applicable_from().is_none_or(|from| from <= date)
}

pub struct ObjectiveTimeline<'a, T> {
    records: Vec<&'a T>,
}

impl<'a, T: Objective> ObjectiveTimeline<'a, T> {
    /// Orders `records` by `applicable_from`. The sort is stable, so among
    /// records sharing a date the one supplied last wins.
    pub fn new(records: &'a [T]) -> Self {
        let mut records: Vec<&'a T> = records.iter().collect();
        records.sort_by_key(|r| r.applicable_from());
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Record in effect on `date`, or `None` if every record starts later.
    pub fn at(&self, date: NaiveDate) -> Option<&'a T> {
        let applicable = self.records.partition_point(|r| applies_on(*r, date));
        applicable.checked_sub(1).map(|i| self.records[i])
    }

    pub fn count_at(&self, date: NaiveDate) -> Option<u32> {
        self.at(date).map(|r| r.count())
    }

    /// First day any record is in effect. `None` when a record has always
    /// applied, or when there are no records at all.
    pub fn starts_on(&self) -> Option<NaiveDate> {
        self.records.first().and_then(|r| r.applicable_from())
    }

    pub fn reverse_cursor(&self) -> ReverseCursor<'_, 'a, T> {
        ReverseCursor {
            records: &self.records,
            remaining: self.records.len(),
            last_seek: None,
        }
    }
}

/// Merge-join of descending dates against the timeline.
///
/// Meant to be driven with non-increasing dates. Each such seek only drops
/// records from the tail, so a full pass over any number of dates costs at
/// most `len` steps on top of one step per date. Seeking a later date than
/// the previous one rewinds the cursor to the newest record first, so the
/// answer always matches [`ObjectiveTimeline::at`].
pub struct ReverseCursor<'t, 'a, T> {
    records: &'t [&'a T],
    remaining: usize,
    last_seek: Option<NaiveDate>,
}

impl<'a, T: Objective> ReverseCursor<'_, 'a, T> {
    pub fn seek(&mut self, date: NaiveDate) -> Option<&'a T> {
        if self.last_seek.is_some_and(|last| date > last) {
            self.remaining = self.records.len();
        }
        self.last_seek = Some(date);

        while self.remaining > 0 && !applies_on(self.records[self.remaining - 1], date) {
            self.remaining -= 1;
        }
        self.remaining.checked_sub(1).map(|i| self.records[i])
    }
}
