use anyhow::{Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::num::NonZeroU32;

use crate::cli::args::{CategoryCommands, HabitCommands};
use trabits::config::AppConfig;
use trabits::db::repository::{
    CategoryRepo, HabitRepo, NewHabit, ObjectiveRepo, ResultRepo, SnapshotRepo,
};
use trabits::models::{Habit, HabitId, MonthProgress, WeekProgress};
use trabits::stats::{
    DateInterval, HabitStatistics, ObjectiveTimeline, Section, StatisticsAggregator,
};
use trabits::utils::format::{
    day_glyph, fit_title, parse_date_arg, progress_bar, weekday_label,
};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

const TITLE_WIDTH: usize = 22;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_date(arg: Option<&str>) -> Result<NaiveDate> {
    arg.map(parse_date_arg).transpose().map(|d| d.unwrap_or_else(today))
}

fn require_habit(conn: &Connection, id: HabitId) -> Result<Habit> {
    HabitRepo::find(conn, id)?.ok_or_else(|| anyhow!("Habit {} not found", id))
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub fn handle_category(conn: &Connection, action: &CategoryCommands) -> Result<()> {
    match action {
        CategoryCommands::Add { title, color } => {
            let id = CategoryRepo::add(conn, title, color)?;
            println_colored!(GREEN, "  ✓ Added category {} — {}", id, title);
        }
        CategoryCommands::List => {
            let categories = CategoryRepo::list(conn)?;
            println!();
            if categories.is_empty() {
                println_colored!(DIM, "  No categories yet");
            } else {
                println_colored!(GOLD, "  Categories");
                println!();
                for c in &categories {
                    println!("  {:>4}  {}  {}", c.id, fit_title(&c.title, TITLE_WIDTH), c.color);
                }
            }
            println!();
        }
        CategoryCommands::Delete { id } => {
            if CategoryRepo::delete(conn, *id)? {
                println_colored!(AMBER, "  Deleted category {}; its habits are now uncategorized", id);
            } else {
                bail!("Category {} not found", id);
            }
        }
    }
    Ok(())
}

// ─── Habits ──────────────────────────────────────────────────────────────────

pub fn handle_habit(conn: &Connection, config: &AppConfig, action: &HabitCommands) -> Result<()> {
    match action {
        HabitCommands::Add {
            title,
            category,
            target,
            goal,
        } => {
            let day_target =
                NonZeroU32::new(*target).ok_or_else(|| anyhow!("Target must be at least 1"))?;
            if let Some(category_id) = category {
                if CategoryRepo::find(conn, *category_id)?.is_none() {
                    bail!("Category {} not found", category_id);
                }
            }
            let id = HabitRepo::add(
                conn,
                &NewHabit {
                    title,
                    category_id: *category,
                    day_target,
                    week_goal: *goal,
                },
            )?;
            println_colored!(GREEN, "  ✓ Added habit {} — {}", id, title);
        }
        HabitCommands::List { archived } => {
            list_habits(conn, *archived || config.display.show_archived)?;
        }
        HabitCommands::Archive { id } => {
            let habit = require_habit(conn, *id)?;
            HabitRepo::set_archived(conn, *id, Some(Local::now().naive_local()))?;
            println_colored!(DIM, "  Archived {}", habit.title);
        }
        HabitCommands::Restore { id } => {
            let habit = require_habit(conn, *id)?;
            HabitRepo::set_archived(conn, *id, None)?;
            println_colored!(GREEN, "  ✓ Restored {}", habit.title);
        }
        HabitCommands::Delete { id } => {
            let habit = require_habit(conn, *id)?;
            HabitRepo::delete(conn, *id)?;
            println_colored!(RED, "  ✗ Deleted {} and its history", habit.title);
        }
        HabitCommands::Target { id, count, from } => {
            let habit = require_habit(conn, *id)?;
            let count =
                NonZeroU32::new(*count).ok_or_else(|| anyhow!("Target must be at least 1"))?;
            let from = resolve_date(from.as_deref())?;
            ObjectiveRepo::set_day_target(conn, *id, count, Some(from))?;
            println_colored!(
                GREEN,
                "  ✓ {} — {} per day from {}",
                habit.title,
                count,
                from
            );
        }
        HabitCommands::Goal { id, count, from } => {
            let habit = require_habit(conn, *id)?;
            let from = resolve_date(from.as_deref())?;
            ObjectiveRepo::set_week_goal(conn, *id, *count, Some(from))?;
            if *count == 0 {
                println_colored!(DIM, "  {} — weekly goal cleared from {}", habit.title, from);
            } else {
                println_colored!(
                    GREEN,
                    "  ✓ {} — {} days per week from {}",
                    habit.title,
                    count,
                    from
                );
            }
        }
    }
    Ok(())
}

fn list_habits(conn: &Connection, include_archived: bool) -> Result<()> {
    let habits = HabitRepo::list(conn, include_archived)?;
    let categories = CategoryRepo::list(conn)?;
    let today = today();

    println!();
    if habits.is_empty() {
        println_colored!(DIM, "  No habits yet — add one with `trabits habit add <title>`");
        println!();
        return Ok(());
    }

    println_colored!(GOLD, "  Habits");
    println!();
    for habit in &habits {
        let targets = ObjectiveRepo::day_targets(conn, habit.id, today)?;
        let goals = ObjectiveRepo::week_goals(conn, habit.id, today)?;
        let target = ObjectiveTimeline::new(&targets).count_at(today).unwrap_or(1);
        let goal = ObjectiveTimeline::new(&goals)
            .at(today)
            .filter(|g| g.is_set())
            .map_or_else(|| "no goal".to_string(), |g| format!("{}/week", g.count));
        let category = habit
            .category_id
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map(|c| c.title.as_str())
            .unwrap_or("—");

        let line = format!(
            "  {:>4}  {}  {}/day  {}  {}",
            habit.id,
            fit_title(&habit.title, TITLE_WIDTH),
            target,
            goal,
            category
        );
        if habit.is_archived() {
            println_colored!(DIM, "{}  (archived)", line);
        } else {
            println!("{}", line);
        }
    }
    println!();
    Ok(())
}

// ─── Mark / unmark ───────────────────────────────────────────────────────────

pub fn handle_mark(conn: &Connection, id: HabitId, date: Option<&str>, count: u32) -> Result<()> {
    let habit = require_habit(conn, id)?;
    let date = resolve_date(date)?;
    let total = ResultRepo::adjust(conn, id, date, i64::from(count))?;
    print_day_total(conn, &habit, date, total)
}

pub fn handle_unmark(conn: &Connection, id: HabitId, date: Option<&str>) -> Result<()> {
    let habit = require_habit(conn, id)?;
    let date = resolve_date(date)?;
    let total = ResultRepo::adjust(conn, id, date, -1)?;
    print_day_total(conn, &habit, date, total)
}

fn print_day_total(conn: &Connection, habit: &Habit, date: NaiveDate, total: u32) -> Result<()> {
    let targets = ObjectiveRepo::day_targets(conn, habit.id, date)?;
    let target = ObjectiveTimeline::new(&targets).count_at(date).unwrap_or(1);
    if total >= target {
        println_colored!(GREEN, "  ✓ {} — {}/{} on {} (done!)", habit.title, total, target, date);
    } else if total > 0 {
        println_colored!(AMBER, "  ◑ {} — {}/{} on {}", habit.title, total, target, date);
    } else {
        println_colored!(DIM, "  ○ {} — 0/{} on {}", habit.title, target, date);
    }
    Ok(())
}

// ─── Reports ─────────────────────────────────────────────────────────────────

fn aggregator(config: &AppConfig) -> Result<StatisticsAggregator> {
    Ok(StatisticsAggregator::new(config.statistics_options(today())?))
}

pub fn handle_week(conn: &Connection, config: &AppConfig, date: Option<&str>) -> Result<()> {
    let date = resolve_date(date)?;
    let aggregator = aggregator(config)?;
    let interval = DateInterval::week_containing(date, aggregator.options().first_weekday);
    let snapshot = SnapshotRepo::load(conn, interval)?;
    let stats = aggregator.week(&snapshot, date)?;

    println!();
    println_colored!(GOLD, "  Week {}  ·  {} habits", stats.interval, stats.habit_count());
    println!();
    if stats.is_empty() {
        println_colored!(DIM, "  No records for this period");
        println!();
        return Ok(());
    }

    let header: Vec<&str> = stats.weekdays.iter().map(|d| weekday_label(*d)).collect();
    println_colored!(DIM, "  {}  {}", " ".repeat(TITLE_WIDTH), header.join(" "));

    for section in &stats.sections {
        print_section_title(section);
        for habit in &section.habits {
            print_week_row(habit);
        }
    }
    println!();
    Ok(())
}

fn print_section_title<P>(section: &Section<P>) {
    println!();
    println_colored!(BOLD, "  {}", section.kind.title());
}

fn goal_text(week: &WeekProgress) -> String {
    if !week.has_goal() {
        return format!("{} days", week.week_result);
    }
    if week.goal_achieved() {
        return format!("{}{}/{}\x1b[0m", GREEN, week.week_result, week.week_goal);
    }
    format!(
        "{}{}/{} ({} to go)\x1b[0m",
        AMBER,
        week.week_result,
        week.week_goal,
        week.remaining_to_goal()
    )
}

fn print_week_row(stats: &HabitStatistics<WeekProgress>) {
    let glyphs: Vec<&str> = stats.progress.days.iter().map(day_glyph).collect();
    let target = stats.day_target.map_or(1, |t| t.count.get());
    println!(
        "  {}  {}   {}  {} {:>3.0}%  today {}/{}  streak {}",
        fit_title(&stats.habit.title, TITLE_WIDTH),
        glyphs.join("  "),
        goal_text(&stats.progress),
        progress_bar(stats.progress.week_result, 7, 7),
        stats.progress.completion_ratio() * 100.0,
        stats.today_count,
        target,
        stats.streak.current
    );
}

pub fn handle_month(conn: &Connection, config: &AppConfig, date: Option<&str>) -> Result<()> {
    let date = resolve_date(date)?;
    let aggregator = aggregator(config)?;
    let grid = DateInterval::month_containing(date).week_aligned(aggregator.options().first_weekday);
    let snapshot = SnapshotRepo::load(conn, grid)?;
    let stats = aggregator.month(&snapshot, date)?;

    println!();
    println_colored!(GOLD, "  {}", stats.month.start().format("%B %Y"));
    println!();
    if stats.is_empty() {
        println_colored!(DIM, "  No records for this period");
        println!();
        return Ok(());
    }

    let header: Vec<&str> = stats.weekdays.iter().map(|d| weekday_label(*d)).collect();
    for section in &stats.sections {
        print_section_title(section);
        for habit in &section.habits {
            print_month_block(habit, &header);
        }
    }
    println!();
    Ok(())
}

fn print_month_block(stats: &HabitStatistics<MonthProgress>, header: &[&str]) {
    let progress = &stats.progress;
    println!();
    println!(
        "  {}  {} days {:.0}% ({} completions)  ·  {}/{} weekly goals  ·  streak {} (best {})",
        fit_title(&stats.habit.title, TITLE_WIDTH),
        progress.month_result,
        progress.completion_ratio() * 100.0,
        stats.period_count,
        progress.weeks_with_goal_achieved(),
        progress.weeks.iter().filter(|w| w.has_goal()).count(),
        stats.streak.current,
        stats.streak.best
    );
    println_colored!(DIM, "    {}", header.join(" "));
    for week in &progress.weeks {
        let glyphs: Vec<&str> = week.days.iter().map(day_glyph).collect();
        println!("    {}   {}", glyphs.join("  "), goal_text(week));
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

pub fn handle_config(
    config: &mut AppConfig,
    first_weekday: Option<&str>,
    group_by_category: Option<bool>,
    show_archived: Option<bool>,
) -> Result<()> {
    if config.update(first_weekday, group_by_category, show_archived)? {
        config.save()?;
        println_colored!(GREEN, "  ✓ Saved {}", AppConfig::config_path()?.display());
    }

    println!();
    println_colored!(GOLD, "  Settings");
    println!();
    println!("  first weekday       {}", config.calendar.first_weekday()?);
    println!("  group by category   {}", config.display.group_by_category);
    println!("  show archived       {}", config.display.show_archived);
    println!();
    Ok(())
}

// ─── Export ──────────────────────────────────────────────────────────────────

pub fn handle_export(
    conn: &Connection,
    config: &AppConfig,
    month: bool,
    date: Option<&str>,
) -> Result<()> {
    let date = resolve_date(date)?;
    let aggregator = aggregator(config)?;
    let first_weekday = aggregator.options().first_weekday;

    let json = if month {
        let grid = DateInterval::month_containing(date).week_aligned(first_weekday);
        let snapshot = SnapshotRepo::load(conn, grid)?;
        serde_json::to_string_pretty(&aggregator.month(&snapshot, date)?)?
    } else {
        let interval = DateInterval::week_containing(date, first_weekday);
        let snapshot = SnapshotRepo::load(conn, interval)?;
        serde_json::to_string_pretty(&aggregator.week(&snapshot, date)?)?
    };
    println!("{}", json);
    Ok(())
}
