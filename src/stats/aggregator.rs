use chrono::{Days, NaiveDate, Weekday};
use log::debug;
use serde::Serialize;

use super::completion_index::CompletionIndex;
use super::error::Result;
use super::interval::{DateInterval, start_of_week, weekday_symbols};
use super::progress::{ProgressCalculator, streak};
use super::timeline::ObjectiveTimeline;
use crate::models::{
    Category, CategoryId, DayTarget, Habit, HabitId, MonthProgress, Streak,
    WeekGoal, WeekProgress,
};

/// Settings threaded into every aggregation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsOptions {
    pub first_weekday: Weekday,
    pub group_by_category: bool,
    pub today: NaiveDate,
}

/// Everything the aggregator needs, already loaded by the caller.
#[derive(Debug, Clone, Default)]
pub struct StatisticsSnapshot {
    pub categories: Vec<Category>,
    pub habits: Vec<Habit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum SectionKind {
    Category(Category),
    /// Habits without a category while grouping is on.
    Uncategorized,
    /// Every habit, when grouping is off.
    All,
}

impl SectionKind {
    pub fn title(&self) -> &str {
        match self {
            SectionKind::Category(c) => &c.title,
            SectionKind::Uncategorized => "Uncategorized",
            SectionKind::All => "Habits",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitSummary {
    pub id: HabitId,
    pub title: String,
    pub category_id: Option<CategoryId>,
    pub priority: i32,
    pub archived: bool,
}

impl From<&Habit> for HabitSummary {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            title: habit.title.clone(),
            category_id: habit.category_id,
            priority: habit.priority,
            archived: habit.is_archived(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStatistics<P> {
    pub habit: HabitSummary,
    pub progress: P,
    /// Day target in effect on the reference day.
    pub day_target: Option<DayTarget>,
    /// Week goal attributed to the week of the reference day.
    pub week_goal: Option<WeekGoal>,
    pub today_count: u32,
    /// Completions recorded across the whole period.
    pub period_count: u32,
    pub streak: Streak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section<P> {
    pub kind: SectionKind,
    pub habits: Vec<HabitStatistics<P>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekStatistics {
    pub interval: DateInterval,
    pub weekdays: [Weekday; 7],
    pub sections: Vec<Section<WeekProgress>>,
}

impl WeekStatistics {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn habit_count(&self) -> usize {
        self.sections.iter().map(|s| s.habits.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthStatistics {
    pub month: DateInterval,
    pub grid: DateInterval,
    pub weekdays: [Weekday; 7],
    pub sections: Vec<Section<MonthProgress>>,
}

impl MonthStatistics {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn habit_count(&self) -> usize {
        self.sections.iter().map(|s| s.habits.len()).sum()
    }
}

/// Builds per-habit statistics for a week or a month. Holds no state between
/// calls; every call recomputes from the snapshot it is given.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsAggregator {
    options: StatisticsOptions,
    calculator: ProgressCalculator,
}

impl StatisticsAggregator {
    pub fn new(options: StatisticsOptions) -> Self {
        Self {
            options,
            calculator: ProgressCalculator::new(options.first_weekday),
        }
    }

    pub fn options(&self) -> &StatisticsOptions {
        &self.options
    }

    /// Statistics for the week containing `date`.
    pub fn week(&self, snapshot: &StatisticsSnapshot, date: NaiveDate) -> Result<WeekStatistics> {
        let interval = DateInterval::week_containing(date, self.options.first_weekday);
        debug!(
            "week statistics for {} over {} habits",
            interval,
            snapshot.habits.len()
        );

        let sections = self.sections(snapshot, interval, |habit| {
            let progress = self.calculator.week(habit, interval)?;
            let streak = self.streak(habit, interval)?;
            self.habit_statistics(habit, interval, progress, streak)
        })?;

        Ok(WeekStatistics {
            interval,
            weekdays: weekday_symbols(self.options.first_weekday),
            sections,
        })
    }

    /// Statistics for the calendar month containing `date`.
    pub fn month(&self, snapshot: &StatisticsSnapshot, date: NaiveDate) -> Result<MonthStatistics> {
        let month = DateInterval::month_containing(date);
        let grid = month.week_aligned(self.options.first_weekday);
        debug!(
            "month statistics for {} (grid {}) over {} habits",
            month,
            grid,
            snapshot.habits.len()
        );

        let sections = self.sections(snapshot, month, |habit| {
            let progress = self.calculator.month(habit, month)?;
            let streak = self.streak(habit, month)?;
            self.habit_statistics(habit, month, progress, streak)
        })?;

        Ok(MonthStatistics {
            month,
            grid,
            weekdays: weekday_symbols(self.options.first_weekday),
            sections,
        })
    }

    /// Today when it falls inside the period, otherwise its last day.
    fn reference_day(&self, period: DateInterval) -> NaiveDate {
        if period.contains(self.options.today) {
            self.options.today
        } else {
            period.last_day()
        }
    }

    /// Runs over the habit's whole history up to the end of `period`, so a
    /// streak carries across week and month boundaries.
    fn streak(&self, habit: &Habit, period: DateInterval) -> Result<Streak> {
        let days = self.calculator.history(habit, period.last_day())?;
        Ok(streak(&days, self.reference_day(period), self.options.today))
    }

    fn habit_statistics<P>(
        &self,
        habit: &Habit,
        period: DateInterval,
        progress: P,
        streak: Streak,
    ) -> Result<HabitStatistics<P>> {
        let reference = self.reference_day(period);
        let next_week = start_of_week(reference, self.options.first_weekday) + Days::new(7);
        let index = CompletionIndex::build(period, &habit.results);

        Ok(HabitStatistics {
            habit: HabitSummary::from(habit),
            progress,
            day_target: ObjectiveTimeline::new(&habit.day_targets).at(reference).copied(),
            week_goal: ObjectiveTimeline::new(&habit.week_goals).at(next_week).copied(),
            today_count: index.today_count(self.options.today),
            period_count: index.total(),
            streak,
        })
    }

    fn sections<P>(
        &self,
        snapshot: &StatisticsSnapshot,
        period: DateInterval,
        mut build: impl FnMut(&Habit) -> Result<HabitStatistics<P>>,
    ) -> Result<Vec<Section<P>>> {
        let mut habits: Vec<&Habit> = snapshot
            .habits
            .iter()
            .filter(|h| h.was_active_since(period.start()))
            .collect();
        habits.sort_by_key(|h| (h.priority, h.id));

        if !self.options.group_by_category {
            if habits.is_empty() {
                return Ok(Vec::new());
            }
            let habits = habits.into_iter().map(&mut build).collect::<Result<_>>()?;
            return Ok(vec![Section {
                kind: SectionKind::All,
                habits,
            }]);
        }

        let mut categories: Vec<&Category> = snapshot.categories.iter().collect();
        categories.sort_by_key(|c| (c.priority, c.id));

        let mut sections = Vec::new();
        for category in categories {
            let members = habits
                .iter()
                .filter(|h| h.category_id == Some(category.id))
                .map(|&h| build(h))
                .collect::<Result<Vec<_>>>()?;
            if !members.is_empty() {
                sections.push(Section {
                    kind: SectionKind::Category(category.clone()),
                    habits: members,
                });
            }
        }

        let known = |id: CategoryId| snapshot.categories.iter().any(|c| c.id == id);
        let uncategorized = habits
            .iter()
            .filter(|h| !h.category_id.is_some_and(known))
            .map(|&h| build(h))
            .collect::<Result<Vec<_>>>()?;
        if !uncategorized.is_empty() {
            sections.push(Section {
                kind: SectionKind::Uncategorized,
                habits: uncategorized,
            });
        }

        Ok(sections)
    }
}
