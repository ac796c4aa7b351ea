use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::stats::DateInterval;

/// Classification of one day's completions against the day target in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEntry {
    None { target: u32 },
    Partial { completed: u32, target: u32 },
    Completed { completed: u32, target: u32 },
}

impl ProgressEntry {
    pub fn classify(completed: u32, target: NonZeroU32) -> Self {
        let target = target.get();
        if completed == 0 {
            ProgressEntry::None { target }
        } else if completed < target {
            ProgressEntry::Partial { completed, target }
        } else {
            ProgressEntry::Completed { completed, target }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProgressEntry::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub entry: ProgressEntry,
    /// False for grid padding outside the period being reported.
    pub in_period: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekProgress {
    pub start: NaiveDate,
    pub days: Vec<DayProgress>,
    /// Completed days among `days`.
    pub week_result: u32,
    /// Goal in effect at the first day of the following week.
    pub week_goal: u32,
}

impl WeekProgress {
    pub fn new(start: NaiveDate, days: Vec<DayProgress>, week_goal: u32) -> Self {
        let week_result = days.iter().filter(|d| d.entry.is_completed()).count() as u32;
        Self {
            start,
            days,
            week_result,
            week_goal,
        }
    }

    pub fn has_goal(&self) -> bool {
        self.week_goal > 0
    }

    pub fn goal_achieved(&self) -> bool {
        self.has_goal() && self.week_result >= self.week_goal
    }

    pub fn remaining_to_goal(&self) -> u32 {
        self.week_goal.saturating_sub(self.week_result)
    }

    pub fn completion_ratio(&self) -> f64 {
        if self.days.is_empty() {
            0.0
        } else {
            self.week_result as f64 / self.days.len() as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthProgress {
    pub month: DateInterval,
    pub grid: DateInterval,
    pub weeks: Vec<WeekProgress>,
    /// Completed days inside the month itself; padding is not counted.
    pub month_result: u32,
}

impl MonthProgress {
    pub fn new(month: DateInterval, grid: DateInterval, weeks: Vec<WeekProgress>) -> Self {
        let month_result = weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .filter(|d| d.in_period && d.entry.is_completed())
            .count() as u32;
        Self {
            month,
            grid,
            weeks,
            month_result,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = &DayProgress> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }

    pub fn weeks_with_goal_achieved(&self) -> u32 {
        self.weeks.iter().filter(|w| w.goal_achieved()).count() as u32
    }

    pub fn completion_ratio(&self) -> f64 {
        self.month_result as f64 / self.month.len_days() as f64
    }
}
