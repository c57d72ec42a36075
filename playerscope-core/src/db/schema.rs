//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: platform records read by the analyzers
    r#"
    -- ============================================
    -- Platform records (owned by the gaming platform)
    -- ============================================

    CREATE TABLE IF NOT EXISTS players (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        username           TEXT NOT NULL UNIQUE,
        status             TEXT NOT NULL DEFAULT 'active',
        verification_level TEXT NOT NULL DEFAULT 'none',
        created_at         DATETIME NOT NULL,
        last_login_at      DATETIME
    );

    CREATE TABLE IF NOT EXISTS login_sessions (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id   INTEGER NOT NULL REFERENCES players(id),
        ip_address  TEXT,
        created_at  DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS game_sessions (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id   INTEGER NOT NULL REFERENCES players(id),
        game_type   TEXT NOT NULL,
        started_at  DATETIME NOT NULL,
        ended_at    DATETIME
    );

    CREATE TABLE IF NOT EXISTS game_rounds (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id  INTEGER NOT NULL REFERENCES game_sessions(id),
        bet_amount  REAL NOT NULL DEFAULT 0,
        win_amount  REAL NOT NULL DEFAULT 0,
        result      TEXT NOT NULL,
        played_at   DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id        INTEGER NOT NULL REFERENCES players(id),
        transaction_type TEXT NOT NULL,
        amount           REAL NOT NULL,
        status           TEXT NOT NULL DEFAULT 'completed',
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_login_sessions_player ON login_sessions(player_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_game_sessions_player ON game_sessions(player_id, started_at);
    CREATE INDEX IF NOT EXISTS idx_game_rounds_session ON game_rounds(session_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_player ON transactions(player_id, created_at);
    "#,
    // Version 2: analysis history (append-only snapshots)
    r#"
    -- ============================================
    -- Analysis history (owned by playerscope)
    -- ============================================

    CREATE TABLE IF NOT EXISTS game_preference_analyses (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id          INTEGER NOT NULL REFERENCES players(id),
        time_range         TEXT NOT NULL,
        favorite_game_type TEXT,
        analysis_data      JSON NOT NULL,
        created_at         DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS spending_habits_analyses (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id      INTEGER NOT NULL REFERENCES players(id),
        time_range     TEXT NOT NULL,
        spending_level TEXT,
        analysis_data  JSON NOT NULL,
        created_at     DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS value_score_analyses (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        player_id      INTEGER NOT NULL REFERENCES players(id),
        time_range     TEXT NOT NULL,
        overall_score  REAL NOT NULL,
        value_category TEXT NOT NULL,
        analysis_data  JSON NOT NULL,
        created_at     DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_game_preference_player ON game_preference_analyses(player_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_spending_habits_player ON spending_habits_analyses(player_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_value_score_player ON value_score_analyses(player_id, created_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::debug!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Applying migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get current schema version
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "players",
            "login_sessions",
            "game_sessions",
            "game_rounds",
            "transactions",
            "game_preference_analyses",
            "spending_habits_analyses",
            "value_score_analyses",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        run_migrations(&conn).unwrap();

        let fk_list: Vec<String> = conn
            .prepare("PRAGMA foreign_key_list(game_rounds)")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(2))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(
            fk_list.iter().any(|table| table == "game_sessions"),
            "game_rounds should reference game_sessions"
        );
    }
}
