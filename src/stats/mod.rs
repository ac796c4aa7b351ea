//! Progress statistics over habits, their versioned objectives and their
//! daily results. Everything here is a pure function of its inputs.

pub mod aggregator;
pub mod completion_index;
pub mod error;
pub mod interval;
pub mod progress;
pub mod timeline;

pub use aggregator::{
    HabitStatistics, HabitSummary, MonthStatistics, Section, SectionKind, StatisticsAggregator,
    StatisticsOptions, StatisticsSnapshot, WeekStatistics,
};
pub use completion_index::CompletionIndex;
pub use error::{Result, StatsError};
pub use interval::{DateInterval, start_of_week, weekday_slot, weekday_symbols};
pub use progress::{DEFAULT_DAY_TARGET, ProgressCalculator, streak};
pub use timeline::{Objective, ObjectiveTimeline, ReverseCursor};
