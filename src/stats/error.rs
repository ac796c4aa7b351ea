use chrono::NaiveDate;
use thiserror::Error;

use crate::models::HabitId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The habit has a target history, yet none of its records applies on
    /// `date`. Every habit gets a baseline target when it is created, so this
    /// points at inconsistent stored data.
    #[error("habit {habit} has no day target in effect on {date}")]
    MissingBaseline { habit: HabitId, date: NaiveDate },

    #[error("interval end {end} must be after its start {start}")]
    MalformedInterval { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, StatsError>;
