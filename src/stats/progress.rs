use chrono::{Days, NaiveDate, Weekday};
use std::num::NonZeroU32;

use super::completion_index::CompletionIndex;
use super::error::{Result, StatsError};
use super::interval::DateInterval;
use super::timeline::ObjectiveTimeline;
use crate::models::{DayProgress, Habit, MonthProgress, ProgressEntry, Streak, WeekProgress};

/// Target used for a habit that has never had a day target configured.
pub const DEFAULT_DAY_TARGET: NonZeroU32 = NonZeroU32::MIN;

#[derive(Debug, Clone, Copy)]
pub struct ProgressCalculator {
    first_weekday: Weekday,
}

impl ProgressCalculator {
    pub fn new(first_weekday: Weekday) -> Self {
        Self { first_weekday }
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    /// Classifies each day of `range`, returned in ascending date order.
    /// Days outside `period` are kept and flagged with `in_period = false`.
    pub fn days(
        &self,
        habit: &Habit,
        range: DateInterval,
        period: DateInterval,
    ) -> Result<Vec<DayProgress>> {
        let targets = ObjectiveTimeline::new(&habit.day_targets);
        let index = CompletionIndex::build(range, &habit.results);
        let mut cursor = targets.reverse_cursor();

        let mut days = Vec::with_capacity(range.len_days());
        // Walk backward so the target cursor only ever moves toward older records.
        for date in range.days().rev() {
            let target = if targets.is_empty() {
                DEFAULT_DAY_TARGET
            } else {
                cursor
                    .seek(date)
                    .map(|t| t.count)
                    .ok_or(StatsError::MissingBaseline {
                        habit: habit.id,
                        date,
                    })?
            };
            days.push(DayProgress {
                date,
                entry: ProgressEntry::classify(index.count_on(date), target),
                in_period: period.contains(date),
            });
        }
        days.reverse();
        Ok(days)
    }

    /// Classifies every day from the habit's first recorded completion
    /// through `until`. Days before its first day target took effect are
    /// left out. Empty when nothing was recorded by then.
    pub fn history(&self, habit: &Habit, until: NaiveDate) -> Result<Vec<DayProgress>> {
        let Some(first) = habit.results.iter().map(|r| r.date).min() else {
            return Ok(Vec::new());
        };
        let start = match ObjectiveTimeline::new(&habit.day_targets).starts_on() {
            Some(from) => first.max(from),
            None => first,
        };
        let Some(end) = until.succ_opt() else {
            return Ok(Vec::new());
        };
        if start >= end {
            return Ok(Vec::new());
        }

        let range = DateInterval::new(start, end)?;
        self.days(habit, range, range)
    }

    pub fn week(&self, habit: &Habit, week: DateInterval) -> Result<WeekProgress> {
        let days = self.days(habit, week, week)?;
        let goals = ObjectiveTimeline::new(&habit.week_goals);
        let week_goal = goals.count_at(week.end()).unwrap_or(0);
        Ok(WeekProgress::new(week.start(), days, week_goal))
    }

    /// Progress over `month` laid out on whole calendar weeks.
    pub fn month(&self, habit: &Habit, month: DateInterval) -> Result<MonthProgress> {
        let grid = month.week_aligned(self.first_weekday);
        let days = self.days(habit, grid, month)?;

        let goals = ObjectiveTimeline::new(&habit.week_goals);
        let mut cursor = goals.reverse_cursor();
        let mut weeks: Vec<WeekProgress> = days
            .chunks(7)
            .rev()
            .map(|week| {
                let start = week[0].date;
                // A week is judged by the goal in effect when the next week begins.
                let week_goal = cursor
                    .seek(start + Days::new(7))
                    .map_or(0, |g| g.count);
                WeekProgress::new(start, week.to_vec(), week_goal)
            })
            .collect();
        weeks.reverse();

        Ok(MonthProgress::new(month, grid, weeks))
    }
}

/// Streak of consecutive completed days.
///
/// `days` must be consecutive and ascending, as returned by
/// [`ProgressCalculator::history`]. `best` is the longest run anywhere in
/// `days`. `current` is the run ending
/// at `reference`; when `reference` is `today` and not yet completed, the run
/// ending the day before counts instead.
pub fn streak(days: &[DayProgress], reference: NaiveDate, today: NaiveDate) -> Streak {
    let mut best = 0u32;
    let mut run = 0u32;
    for day in days {
        if day.entry.is_completed() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }

    let Some(end) = days.iter().position(|d| d.date == reference) else {
        return Streak { current: 0, best };
    };
    let mut considered = &days[..=end];
    if reference == today && !days[end].entry.is_completed() {
        considered = &days[..end];
    }
    let current = considered
        .iter()
        .rev()
        .take_while(|d| d.entry.is_completed())
        .count() as u32;

    Streak { current, best }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayResult, DayTarget, WeekGoal};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn habit_with(targets: Vec<DayTarget>, goals: Vec<WeekGoal>, results: Vec<DayResult>) -> Habit {
        let mut habit = Habit::new(1, "Stretch");
        habit.day_targets = targets;
        habit.week_goals = goals;
        habit.results = results;
        habit
    }

    fn result(d: NaiveDate, count: u32) -> DayResult {
        DayResult::new(d, count).unwrap()
    }

    // Week of Monday 2024-03-04 .. Sunday 2024-03-10
    fn week() -> DateInterval {
        DateInterval::week_containing(date(2024, 3, 6), Weekday::Mon)
    }

    #[test]
    fn test_single_completion_on_wednesday() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            vec![result(date(2024, 3, 6), 1)],
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();

        assert_eq!(progress.days.len(), 7);
        assert_eq!(progress.week_result, 1);
        for day in &progress.days {
            if day.date == date(2024, 3, 6) {
                assert_eq!(day.entry, ProgressEntry::Completed { completed: 1, target: 1 });
            } else {
                assert_eq!(day.entry, ProgressEntry::None { target: 1 });
            }
        }
    }

    #[test]
    fn test_target_change_inside_week() {
        // Target rises from 1 to 3 on Wednesday; Tuesday still uses the old one
        let habit = habit_with(
            vec![
                DayTarget::baseline(nz(1)),
                DayTarget::new(nz(3), Some(date(2024, 3, 6))),
            ],
            vec![],
            vec![result(date(2024, 3, 5), 2), result(date(2024, 3, 7), 2)],
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();

        assert_eq!(progress.days[1].entry, ProgressEntry::Completed { completed: 2, target: 1 });
        assert_eq!(progress.days[3].entry, ProgressEntry::Partial { completed: 2, target: 3 });
        assert_eq!(progress.days[2].entry, ProgressEntry::None { target: 3 });
        assert_eq!(progress.week_result, 1);
    }

    #[test]
    fn test_target_from_monday_applies_to_tuesday() {
        let habit = habit_with(
            vec![
                DayTarget::baseline(nz(1)),
                DayTarget::new(nz(3), Some(date(2024, 3, 4))),
            ],
            vec![],
            vec![result(date(2024, 3, 5), 2)],
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        assert_eq!(progress.days[1].entry, ProgressEntry::Partial { completed: 2, target: 3 });
        assert_eq!(progress.days[0].entry, ProgressEntry::None { target: 3 });
    }

    #[test]
    fn test_target_starting_on_interval_start_covers_whole_week() {
        let habit = habit_with(vec![DayTarget::new(nz(2), Some(date(2024, 3, 4)))], vec![], vec![]);
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        assert!(progress.days.iter().all(|d| d.entry == ProgressEntry::None { target: 2 }));
    }

    #[test]
    fn test_target_starting_mid_week_without_baseline_is_an_error() {
        let habit = habit_with(vec![DayTarget::new(nz(2), Some(date(2024, 3, 6)))], vec![], vec![]);
        let err = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap_err();
        assert_eq!(
            err,
            StatsError::MissingBaseline {
                habit: 1,
                date: date(2024, 3, 5)
            }
        );
    }

    #[test]
    fn test_unconfigured_habit_defaults_to_target_one() {
        let habit = habit_with(vec![], vec![], vec![]);
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        assert!(progress.days.iter().all(|d| d.entry == ProgressEntry::None { target: 1 }));
        assert_eq!(progress.week_result, 0);
        assert_eq!(progress.week_goal, 0);
    }

    #[test]
    fn test_week_goal_comes_from_next_week_start() {
        // Goal of 5 starts next Monday and is already attributed to this week
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![WeekGoal::baseline(2), WeekGoal::new(5, Some(date(2024, 3, 11)))],
            vec![],
        );
        let calc = ProgressCalculator::new(Weekday::Mon);
        assert_eq!(calc.week(&habit, week()).unwrap().week_goal, 5);
        assert_eq!(calc.week(&habit, DateInterval::week_containing(date(2024, 2, 28), Weekday::Mon)).unwrap().week_goal, 2);
    }

    #[test]
    fn test_week_goal_set_mid_week_counts_for_that_week() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![WeekGoal::baseline(0), WeekGoal::new(3, Some(date(2024, 3, 7)))],
            vec![],
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        assert_eq!(progress.week_goal, 3);
    }

    #[test]
    fn test_week_result_counts_completed_days() {
        let results = (4..=10)
            .filter_map(|d| DayResult::new(date(2024, 3, d), d % 3))
            .collect();
        let habit = habit_with(vec![DayTarget::baseline(nz(2))], vec![], results);
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        let completed = progress.days.iter().filter(|d| d.entry.is_completed()).count() as u32;
        assert_eq!(progress.week_result, completed);
    }

    #[test]
    fn test_calculation_is_repeatable() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(2)), DayTarget::new(nz(1), Some(date(2024, 3, 8)))],
            vec![WeekGoal::baseline(3)],
            vec![result(date(2024, 3, 4), 1), result(date(2024, 3, 9), 1)],
        );
        let calc = ProgressCalculator::new(Weekday::Mon);
        assert_eq!(calc.week(&habit, week()).unwrap(), calc.week(&habit, week()).unwrap());
    }

    #[test]
    fn test_month_grid_flags_padding() {
        // March 2024: grid runs Mon 2024-02-26 .. Sun 2024-03-31
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            vec![
                result(date(2024, 2, 27), 1),
                result(date(2024, 3, 1), 1),
                result(date(2024, 3, 31), 1),
            ],
        );
        let month = DateInterval::month_containing(date(2024, 3, 15));
        let progress = ProgressCalculator::new(Weekday::Mon).month(&habit, month).unwrap();

        assert_eq!(progress.weeks.len(), 5);
        assert!(progress.weeks.iter().all(|w| w.days.len() == 7));

        let padding: Vec<_> = progress.days().filter(|d| !d.in_period).collect();
        assert_eq!(padding.len(), 4);
        assert!(padding.iter().all(|d| d.date < date(2024, 3, 1)));

        let feb_27 = progress.days().find(|d| d.date == date(2024, 2, 27)).unwrap();
        assert!(feb_27.entry.is_completed());

        // Padding completions count for the week but not for the month
        assert_eq!(progress.weeks[0].week_result, 2);
        assert_eq!(progress.month_result, 2);
    }

    #[test]
    fn test_month_weeks_resolve_goals_independently() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![
                WeekGoal::baseline(1),
                WeekGoal::new(4, Some(date(2024, 3, 11))),
                WeekGoal::new(0, Some(date(2024, 3, 20))),
            ],
            vec![],
        );
        let month = DateInterval::month_containing(date(2024, 3, 15));
        let progress = ProgressCalculator::new(Weekday::Mon).month(&habit, month).unwrap();
        let goals: Vec<u32> = progress.weeks.iter().map(|w| w.week_goal).collect();
        // Weeks start 02-26, 03-04, 03-11, 03-18, 03-25
        assert_eq!(goals, vec![1, 4, 4, 0, 0]);
    }

    #[test]
    fn test_month_with_sunday_first_weekday() {
        let habit = habit_with(vec![DayTarget::baseline(nz(1))], vec![], vec![]);
        let month = DateInterval::month_containing(date(2024, 3, 15));
        let progress = ProgressCalculator::new(Weekday::Sun).month(&habit, month).unwrap();
        assert_eq!(progress.grid.start(), date(2024, 2, 25));
        assert_eq!(progress.grid.end(), date(2024, 4, 7));
        assert_eq!(progress.weeks.len(), 6);
    }

    #[test]
    fn test_streak_counts_runs() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            [4, 5, 7, 8, 9]
                .into_iter()
                .map(|d| result(date(2024, 3, d), 1))
                .collect(),
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();

        let s = streak(&progress.days, date(2024, 3, 9), date(2024, 3, 20));
        assert_eq!(s, Streak { current: 3, best: 3 });

        let s = streak(&progress.days, date(2024, 3, 10), date(2024, 3, 20));
        assert_eq!(s, Streak { current: 0, best: 3 });
    }

    #[test]
    fn test_streak_ignores_unfinished_today() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            vec![result(date(2024, 3, 5), 1), result(date(2024, 3, 6), 1)],
        );
        let progress = ProgressCalculator::new(Weekday::Mon).week(&habit, week()).unwrap();
        let today = date(2024, 3, 7);
        assert_eq!(streak(&progress.days, today, today).current, 2);
    }

    #[test]
    fn test_history_starts_at_first_result() {
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            vec![result(date(2024, 2, 28), 1), result(date(2024, 3, 2), 1)],
        );
        let days = ProgressCalculator::new(Weekday::Mon)
            .history(&habit, date(2024, 3, 3))
            .unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].date, date(2024, 2, 28));
        assert_eq!(days[4].date, date(2024, 3, 3));
        assert!(days.iter().all(|d| d.in_period));
    }

    #[test]
    fn test_history_skips_days_before_first_target() {
        let habit = habit_with(
            vec![DayTarget::new(nz(2), Some(date(2024, 3, 1)))],
            vec![],
            vec![result(date(2024, 2, 20), 2), result(date(2024, 3, 1), 2)],
        );
        let days = ProgressCalculator::new(Weekday::Mon)
            .history(&habit, date(2024, 3, 2))
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].entry, ProgressEntry::Completed { completed: 2, target: 2 });
    }

    #[test]
    fn test_history_empty_without_results() {
        let habit = habit_with(vec![DayTarget::baseline(nz(1))], vec![], vec![]);
        let calc = ProgressCalculator::new(Weekday::Mon);
        assert!(calc.history(&habit, date(2024, 3, 3)).unwrap().is_empty());

        let later = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            vec![result(date(2024, 3, 10), 1)],
        );
        assert!(calc.history(&later, date(2024, 3, 3)).unwrap().is_empty());
    }

    #[test]
    fn test_streak_runs_across_week_start() {
        // Every day from Tuesday 02-20 through Monday 03-11
        let habit = habit_with(
            vec![DayTarget::baseline(nz(1))],
            vec![],
            (0..21)
                .map(|i| result(date(2024, 2, 20) + Days::new(i), 1))
                .collect(),
        );
        let monday = date(2024, 3, 11);
        let days = ProgressCalculator::new(Weekday::Mon).history(&habit, monday).unwrap();
        assert_eq!(streak(&days, monday, monday), Streak { current: 21, best: 21 });
    }

    #[test]
    fn test_streak_outside_days_is_zero() {
        let s = streak(&[], date(2024, 3, 7), date(2024, 3, 7));
        assert_eq!(s, Streak::default());
    }
}
