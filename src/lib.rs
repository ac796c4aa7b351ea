//! Habit tracking with versioned daily targets and weekly goals.
//!
//! The [`stats`] module turns a habit's completions and objective history
//! into per-day progress, weekly and monthly rollups and streaks. The [`db`]
//! module stores habits in SQLite and loads the snapshots [`stats`] consumes.

pub mod config;
pub mod db;
pub mod models;
pub mod stats;
pub mod utils;
