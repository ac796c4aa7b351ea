pub mod habit;
pub mod stats;

pub use habit::{
    Category, CategoryId, DayResult, DayResultChange, DayTarget, Habit, HabitId, WeekGoal,
};
pub use stats::{DayProgress, MonthProgress, ProgressEntry, Streak, WeekProgress};
