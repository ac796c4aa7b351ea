mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use trabits::config::AppConfig;
use trabits::db::migrations::run_migrations;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Category { action }) => {
            handlers::handle_category(&conn, &action)?;
        }
        Some(Commands::Habit { action }) => {
            handlers::handle_habit(&conn, &config, &action)?;
        }
        Some(Commands::Mark { habit, date, count }) => {
            handlers::handle_mark(&conn, habit, date.as_deref(), count)?;
        }
        Some(Commands::Unmark { habit, date }) => {
            handlers::handle_unmark(&conn, habit, date.as_deref())?;
        }
        Some(Commands::Month { date }) => {
            handlers::handle_month(&conn, &config, date.as_deref())?;
        }
        Some(Commands::Config {
            first_weekday,
            group_by_category,
            show_archived,
        }) => {
            handlers::handle_config(
                &mut config,
                first_weekday.as_deref(),
                group_by_category,
                show_archived,
            )?;
        }
        Some(Commands::Export { month, date }) => {
            handlers::handle_export(&conn, &config, month, date.as_deref())?;
        }
        Some(Commands::Week { date }) => {
            handlers::handle_week(&conn, &config, date.as_deref())?;
        }

        // No subcommand → this week's overview
        None => {
            handlers::handle_week(&conn, &config, None)?;
        }
    }

    Ok(())
}
