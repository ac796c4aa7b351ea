use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension, params};
use std::num::NonZeroU32;

use crate::models::{
    Category, CategoryId, DayResult, DayResultChange, DayTarget, Habit, HabitId, WeekGoal,
};
use crate::stats::{DateInterval, StatisticsSnapshot};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| anyhow!("Bad date '{}': {}", s, e))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| anyhow!("Bad timestamp '{}': {}", s, e))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_optional_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    s.as_deref().map(parse_date).transpose()
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub struct CategoryRepo;

impl CategoryRepo {
    /// Appends a category after the existing ones.
    pub fn add(conn: &Connection, title: &str, color: &str) -> Result<CategoryId> {
        let next_priority: i32 = conn.query_row(
            "SELECT COALESCE(MAX(priority) + 1, 0) FROM categories",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO categories (title, color, priority) VALUES (?1, ?2, ?3)",
            params![title, color, next_priority],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list(conn: &Connection) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, color, priority FROM categories ORDER BY priority, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                title: row.get(1)?,
                color: row.get(2)?,
                priority: row.get(3)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn find(conn: &Connection, id: CategoryId) -> Result<Option<Category>> {
        conn.query_row(
            "SELECT id, title, color, priority FROM categories WHERE id = ?1",
            params![id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    color: row.get(2)?,
                    priority: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// Member habits stay and become uncategorized.
    pub fn delete(conn: &Connection, id: CategoryId) -> Result<bool> {
        let n = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

// ─── Habits ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewHabit<'a> {
    pub title: &'a str,
    pub category_id: Option<CategoryId>,
    pub day_target: NonZeroU32,
    pub week_goal: u32,
}

type HabitRow = (HabitId, String, Option<CategoryId>, i32, Option<String>);

fn habit_from_row(row: HabitRow) -> Result<Habit> {
    let (id, title, category_id, priority, archived_at) = row;
    let mut habit = Habit::new(id, title);
    habit.category_id = category_id;
    habit.priority = priority;
    habit.archived_at = archived_at.as_deref().map(parse_timestamp).transpose()?;
    Ok(habit)
}

pub struct HabitRepo;

impl HabitRepo {
    /// Creates the habit together with its baseline day target and week goal,
    /// which apply from the beginning of time.
    pub fn add(conn: &Connection, new: &NewHabit<'_>) -> Result<HabitId> {
        let tx = conn.unchecked_transaction()?;
        let next_priority: i32 = tx.query_row(
            "SELECT COALESCE(MAX(priority) + 1, 0) FROM habits",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO habits (title, category_id, priority) VALUES (?1, ?2, ?3)",
            params![new.title, new.category_id, next_priority],
        )
        .with_context(|| format!("Creating habit '{}'", new.title))?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO day_targets (habit_id, count, applicable_from) VALUES (?1, ?2, NULL)",
            params![id, new.day_target.get()],
        )?;
        tx.execute(
            "INSERT INTO week_goals (habit_id, count, applicable_from) VALUES (?1, ?2, NULL)",
            params![id, new.week_goal],
        )?;
        tx.commit()?;

        debug!("created habit {} '{}'", id, new.title);
        Ok(id)
    }

    /// Habits without their records, ordered for display.
    pub fn list(conn: &Connection, include_archived: bool) -> Result<Vec<Habit>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, category_id, priority, archived_at
             FROM habits WHERE ?1 OR archived_at IS NULL
             ORDER BY priority, id",
        )?;

        let rows = stmt.query_map(params![include_archived], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            result.push(habit_from_row(r?)?);
        }
        Ok(result)
    }

    pub fn find(conn: &Connection, id: HabitId) -> Result<Option<Habit>> {
        let row = conn
            .query_row(
                "SELECT id, title, category_id, priority, archived_at FROM habits WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(habit_from_row).transpose()
    }

    /// Archives the habit at `at`, or restores it when `at` is `None`.
    pub fn set_archived(
        conn: &Connection,
        id: HabitId,
        at: Option<NaiveDateTime>,
    ) -> Result<bool> {
        let n = conn.execute(
            "UPDATE habits SET archived_at = ?1 WHERE id = ?2",
            params![at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()), id],
        )?;
        Ok(n > 0)
    }

    /// Removes the habit with all of its objectives and results.
    pub fn delete(conn: &Connection, id: HabitId) -> Result<bool> {
        let n = conn.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

// ─── Objectives ──────────────────────────────────────────────────────────────

pub struct ObjectiveRepo;

impl ObjectiveRepo {
    /// Records a new day target effective from `from`. A target already
    /// starting on the same date is replaced.
    pub fn set_day_target(
        conn: &Connection,
        habit_id: HabitId,
        count: NonZeroU32,
        from: Option<NaiveDate>,
    ) -> Result<()> {
        Self::replace(conn, "day_targets", habit_id, count.get(), from)
    }

    /// Records a new week goal effective from `from`. Zero clears the goal.
    pub fn set_week_goal(
        conn: &Connection,
        habit_id: HabitId,
        count: u32,
        from: Option<NaiveDate>,
    ) -> Result<()> {
        Self::replace(conn, "week_goals", habit_id, count, from)
    }

    fn replace(
        conn: &Connection,
        table: &'static str,
        habit_id: HabitId,
        count: u32,
        from: Option<NaiveDate>,
    ) -> Result<()> {
        let from = from.map(format_date);
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            &format!("DELETE FROM {} WHERE habit_id = ?1 AND applicable_from IS ?2", table),
            params![habit_id, from],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {} (habit_id, count, applicable_from) VALUES (?1, ?2, ?3)",
                table
            ),
            params![habit_id, count, from],
        )
        .with_context(|| format!("Updating {} of habit {}", table, habit_id))?;
        tx.commit()?;
        Ok(())
    }

    /// Day targets that apply at or before `until`, oldest first.
    pub fn day_targets(
        conn: &Connection,
        habit_id: HabitId,
        until: NaiveDate,
    ) -> Result<Vec<DayTarget>> {
        let rows = Self::history(conn, "day_targets", habit_id, until)?;
        let mut result = Vec::with_capacity(rows.len());
        for (count, from) in rows {
            let count = u32::try_from(count)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| anyhow!("Invalid day target {} for habit {}", count, habit_id))?;
            result.push(DayTarget::new(count, from));
        }
        Ok(result)
    }

    /// Week goals that apply at or before `until`, oldest first.
    pub fn week_goals(
        conn: &Connection,
        habit_id: HabitId,
        until: NaiveDate,
    ) -> Result<Vec<WeekGoal>> {
        let rows = Self::history(conn, "week_goals", habit_id, until)?;
        let mut result = Vec::with_capacity(rows.len());
        for (count, from) in rows {
            let count = u32::try_from(count)
                .map_err(|_| anyhow!("Invalid week goal {} for habit {}", count, habit_id))?;
            result.push(WeekGoal::new(count, from));
        }
        Ok(result)
    }

    fn history(
        conn: &Connection,
        table: &'static str,
        habit_id: HabitId,
        until: NaiveDate,
    ) -> Result<Vec<(i64, Option<NaiveDate>)>> {
        // NULL sorts first, so the baseline record leads the list
        let mut stmt = conn.prepare(&format!(
            "SELECT count, applicable_from FROM {}
             WHERE habit_id = ?1 AND (applicable_from IS NULL OR applicable_from <= ?2)
             ORDER BY applicable_from, id",
            table
        ))?;

        let rows = stmt.query_map(params![habit_id, format_date(until)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (count, from) = r?;
            result.push((count, parse_optional_date(from)?));
        }
        Ok(result)
    }
}

// ─── Results ─────────────────────────────────────────────────────────────────

pub struct ResultRepo;

impl ResultRepo {
    pub fn count_on(conn: &Connection, habit_id: HabitId, date: NaiveDate) -> Result<u32> {
        let count: Option<i64> = conn
            .query_row(
                "SELECT completion_count FROM day_results WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, format_date(date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.and_then(|c| u32::try_from(c).ok()).unwrap_or(0))
    }

    /// Adds `delta` completions (negative to remove) and returns the new
    /// count. A count reaching zero removes the row.
    pub fn adjust(conn: &Connection, habit_id: HabitId, date: NaiveDate, delta: i64) -> Result<u32> {
        let tx = conn.unchecked_transaction()?;
        let current = Self::count_on(&tx, habit_id, date)?;
        let change = DayResultChange::plan(current, delta);
        let date_str = format_date(date);

        match change {
            DayResultChange::Insert(count) | DayResultChange::Update(count) => {
                tx.execute(
                    "INSERT INTO day_results (habit_id, date, completion_count) VALUES (?1, ?2, ?3)
                     ON CONFLICT(habit_id, date) DO UPDATE SET completion_count = ?3",
                    params![habit_id, date_str, count.get()],
                )
                .with_context(|| format!("Recording result of habit {}", habit_id))?;
            }
            DayResultChange::Delete => {
                tx.execute(
                    "DELETE FROM day_results WHERE habit_id = ?1 AND date = ?2",
                    params![habit_id, date_str],
                )?;
            }
            DayResultChange::Unchanged => {}
        }
        tx.commit()?;

        debug!("habit {} on {}: {:?}", habit_id, date_str, change);
        Ok(change.resulting_count(current))
    }

    /// Results dated inside `range`. Rows with a non-positive count are
    /// skipped, since a missing row already means zero.
    pub fn in_range(
        conn: &Connection,
        habit_id: HabitId,
        range: DateInterval,
    ) -> Result<Vec<DayResult>> {
        Self::query(conn, habit_id, Some(range.start()), range.end())
    }

    /// Every result dated before `end`, oldest first.
    pub fn before(conn: &Connection, habit_id: HabitId, end: NaiveDate) -> Result<Vec<DayResult>> {
        Self::query(conn, habit_id, None, end)
    }

    fn query(
        conn: &Connection,
        habit_id: HabitId,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<Vec<DayResult>> {
        let mut stmt = conn.prepare(
            "SELECT date, completion_count FROM day_results
             WHERE habit_id = ?1 AND (?2 IS NULL OR date >= ?2) AND date < ?3
             ORDER BY date",
        )?;

        let rows = stmt.query_map(
            params![habit_id, start.map(format_date), format_date(end)],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut result = Vec::new();
        for r in rows {
            let (date, count) = r?;
            let date = parse_date(&date)?;
            match u32::try_from(count).ok().and_then(|c| DayResult::new(date, c)) {
                Some(day) => result.push(day),
                None => warn!(
                    "skipping result with count {} for habit {} on {}",
                    count, habit_id, date
                ),
            }
        }
        Ok(result)
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

pub struct SnapshotRepo;

impl SnapshotRepo {
    /// Loads every category and habit with the records needed to compute
    /// statistics over `range`: every result before its end (streaks reach
    /// back past its start), and every objective that applies at or before
    /// its end (which includes the seed record in effect at its start and the
    /// goals judged at the following week's start).
    pub fn load(conn: &Connection, range: DateInterval) -> Result<StatisticsSnapshot> {
        let categories = CategoryRepo::list(conn)?;
        let mut habits = HabitRepo::list(conn, true)?;

        for habit in &mut habits {
            habit.day_targets = ObjectiveRepo::day_targets(conn, habit.id, range.end())?;
            habit.week_goals = ObjectiveRepo::week_goals(conn, habit.id, range.end())?;
            habit.results = ResultRepo::before(conn, habit.id, range.end())?;
        }

        debug!(
            "loaded {} categories and {} habits for {}",
            categories.len(),
            habits.len(),
            range
        );
        Ok(StatisticsSnapshot { categories, habits })
    }
}
