use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Cascades below depend on this; SQLite leaves it off per connection
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS categories (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            title     TEXT NOT NULL,
            color     TEXT NOT NULL DEFAULT '',
            priority  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS habits (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            title        TEXT NOT NULL,
            category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            priority     INTEGER NOT NULL DEFAULT 0,
            archived_at  TEXT,
            created_at   TEXT DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS day_targets (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            count            INTEGER NOT NULL CHECK(count > 0),
            applicable_from  TEXT
        );

        CREATE TABLE IF NOT EXISTS week_goals (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            count            INTEGER NOT NULL CHECK(count >= 0),
            applicable_from  TEXT
        );

        CREATE TABLE IF NOT EXISTS day_results (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id          INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            date              TEXT NOT NULL,
            completion_count  INTEGER NOT NULL,
            UNIQUE(habit_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_day_targets_habit ON day_targets(habit_id, applicable_from);
        CREATE INDEX IF NOT EXISTS idx_week_goals_habit ON week_goals(habit_id, applicable_from);
    ")?;

    Ok(())
}
