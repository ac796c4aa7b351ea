use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

pub type HabitId = i64;
pub type CategoryId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    /// Display colour, stored as given (e.g. "#4caf50").
    pub color: String,
    pub priority: i32,
}

/// How many completions in one day count as "done", effective from
/// `applicable_from` (or from the beginning of time when `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTarget {
    pub count: NonZeroU32,
    pub applicable_from: Option<NaiveDate>,
}

impl DayTarget {
    pub fn new(count: NonZeroU32, applicable_from: Option<NaiveDate>) -> Self {
        Self {
            count,
            applicable_from,
        }
    }

    pub fn baseline(count: NonZeroU32) -> Self {
        Self::new(count, None)
    }
}

/// How many completed days a week should reach. Zero means no goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGoal {
    pub count: u32,
    pub applicable_from: Option<NaiveDate>,
}

impl WeekGoal {
    /// A week has seven days to complete.
    pub const MAX_COUNT: u32 = 7;

    pub fn new(count: u32, applicable_from: Option<NaiveDate>) -> Self {
        Self {
            count,
            applicable_from,
        }
    }

    pub fn baseline(count: u32) -> Self {
        Self::new(count, None)
    }

    pub fn is_set(&self) -> bool {
        self.count > 0
    }
}

/// Completions recorded for one day. A day without a row has zero completions,
/// so the count is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResult {
    pub date: NaiveDate,
    pub completion_count: NonZeroU32,
}

impl DayResult {
    pub fn new(date: NaiveDate, completion_count: u32) -> Option<Self> {
        NonZeroU32::new(completion_count).map(|completion_count| Self {
            date,
            completion_count,
        })
    }
}

/// A habit together with the records it owns. Objective histories are kept
/// sorted ascending by `applicable_from`, `None` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub priority: i32,
    pub archived_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub day_targets: Vec<DayTarget>,
    #[serde(default)]
    pub week_goals: Vec<WeekGoal>,
    #[serde(default)]
    pub results: Vec<DayResult>,
}

impl Habit {
    pub fn new(id: HabitId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            category_id: None,
            priority: 0,
            archived_at: None,
            day_targets: Vec::new(),
            week_goals: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Active habits, and habits archived on or after `start`, belong to a
    /// period beginning at `start`.
    pub fn was_active_since(&self, start: NaiveDate) -> bool {
        match self.archived_at {
            None => true,
            Some(at) => at.date() >= start,
        }
    }
}

/// The write to perform on a (habit, date) result row after adding `delta`
/// completions to the `current` count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayResultChange {
    Insert(NonZeroU32),
    Update(NonZeroU32),
    Delete,
    Unchanged,
}

impl DayResultChange {
    pub fn plan(current: u32, delta: i64) -> Self {
        let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        if next == current {
            return DayResultChange::Unchanged;
        }
        match NonZeroU32::new(next) {
            None => DayResultChange::Delete,
            Some(count) if current == 0 => DayResultChange::Insert(count),
            Some(count) => DayResultChange::Update(count),
        }
    }

    /// Count stored after the change is applied.
    pub fn resulting_count(&self, current: u32) -> u32 {
        match self {
            DayResultChange::Insert(n) | DayResultChange::Update(n) => n.get(),
            DayResultChange::Delete => 0,
            DayResultChange::Unchanged => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_zero_result_is_not_representable() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!(DayResult::new(date, 0).is_none());
        assert_eq!(DayResult::new(date, 2).unwrap().completion_count.get(), 2);
    }

    #[test]
    fn test_plan_increment_from_nothing_inserts() {
        assert_eq!(DayResultChange::plan(0, 1), DayResultChange::Insert(nz(1)));
    }

    #[test]
    fn test_plan_increment_existing_updates() {
        assert_eq!(DayResultChange::plan(2, 1), DayResultChange::Update(nz(3)));
    }

    #[test]
    fn test_plan_decrement_to_zero_deletes() {
        assert_eq!(DayResultChange::plan(1, -1), DayResultChange::Delete);
        assert_eq!(DayResultChange::plan(2, -5), DayResultChange::Delete);
    }

    #[test]
    fn test_plan_decrement_nothing_is_noop() {
        let change = DayResultChange::plan(0, -1);
        assert_eq!(change, DayResultChange::Unchanged);
        assert_eq!(change.resulting_count(0), 0);
    }

    #[test]
    fn test_archived_habit_scope() {
        let mut habit = Habit::new(1, "Read");
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!(habit.was_active_since(start));

        habit.archived_at = start.and_hms_opt(9, 0, 0);
        assert!(habit.was_active_since(start));
        assert!(!habit.was_active_since(start.succ_opt().unwrap()));
    }
}
