use clap::{Parser, Subcommand};
use trabits::models::WeekGoal;

fn week_goal_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(0..=i64::from(WeekGoal::MAX_COUNT))
}

#[derive(Parser, Debug)]
#[command(name = "trabits", version, author, about = "Track habits against daily targets and weekly goals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Category management
    Category {
        #[command(subcommand)]
        action: CategoryCommands,
    },
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: HabitCommands,
    },
    /// Record a completion
    Mark {
        /// Habit id
        habit: i64,
        /// Day to record (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Number of completions to add
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Remove a completion
    Unmark {
        /// Habit id
        habit: i64,
        /// Day to change (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Show progress for the week containing a day
    Week {
        /// Any day of the week (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Show progress for the month containing a day
    Month {
        /// Any day of the month (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Show or change settings
    Config {
        /// Day the week starts on, e.g. "monday" or "sun"
        #[arg(long)]
        first_weekday: Option<String>,
        /// Group reports by category (true/false)
        #[arg(long)]
        group_by_category: Option<bool>,
        /// List archived habits by default (true/false)
        #[arg(long)]
        show_archived: Option<bool>,
    },
    /// Print statistics as JSON to stdout
    Export {
        /// Export the month instead of the week
        #[arg(long)]
        month: bool,
        /// Any day of the period (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category title
        title: String,
        /// Display colour
        #[arg(long, default_value = "")]
        color: String,
    },
    /// List categories
    List,
    /// Delete a category; its habits become uncategorized
    Delete {
        /// Category id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum HabitCommands {
    /// Add a habit
    Add {
        /// Habit title
        title: String,
        /// Category id
        #[arg(long)]
        category: Option<i64>,
        /// Completions per day that count as done
        #[arg(long, default_value = "1")]
        target: u32,
        /// Completed days to aim for each week (0 for none, at most 7)
        #[arg(long, default_value = "0", value_parser = week_goal_parser())]
        goal: u32,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        archived: bool,
    },
    /// Archive a habit
    Archive {
        /// Habit id
        id: i64,
    },
    /// Bring an archived habit back
    Restore {
        /// Habit id
        id: i64,
    },
    /// Delete a habit with all of its history
    Delete {
        /// Habit id
        id: i64,
    },
    /// Change the daily target
    Target {
        /// Habit id
        id: i64,
        /// New completions per day
        count: u32,
        /// First day the target applies (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,
    },
    /// Change the weekly goal
    Goal {
        /// Habit id
        id: i64,
        /// New completed days per week (0 clears the goal, at most 7)
        #[arg(value_parser = week_goal_parser())]
        count: u32,
        /// First day the goal applies (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,
    },
}
