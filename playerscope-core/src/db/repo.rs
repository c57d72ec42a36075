//! Database repository layer
//!
//! Provides record inserts, lookups, and analysis history access.
//! Aggregate queries live in [`super::aggregates`].

use crate::analytics::persistence::{AnalysisKind, AnalysisRecord};
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Format a timestamp the way every table stores it (`2024-05-01T13:45:00Z`).
///
/// Fixed width and UTC, so text comparison matches time order.
pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// One persisted analysis snapshot.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub id: i64,
    pub player_id: PlayerId,
    pub time_range: String,
    /// Favorite game type, spending level or value category
    pub label: Option<String>,
    /// Overall score (value score only)
    pub score: Option<f64>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection()?;
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ============================================
    // Player operations
    // ============================================

    /// Insert a player with a caller-chosen id.
    pub fn insert_player(&self, player: &Player) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO players (id, username, status, verification_level, created_at, last_login_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                player.id,
                player.username,
                player.status.as_str(),
                player.verification_level.as_str(),
                ts(player.created_at),
                player.last_login_at.map(ts),
            ],
        )?;
        Ok(())
    }

    /// Get a player by id
    pub fn get_player(&self, id: PlayerId) -> Result<Option<Player>> {
        let conn = self.connection()?;
        conn.query_row(
            r#"
            SELECT id, username, status, verification_level, created_at, last_login_at
            FROM players WHERE id = ?
            "#,
            [id],
            Self::row_to_player,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_player(row: &Row) -> rusqlite::Result<Player> {
        let status: String = row.get(2)?;
        let verification: String = row.get(3)?;
        let created_at: String = row.get(4)?;
        let last_login_at: Option<String> = row.get(5)?;

        Ok(Player {
            id: row.get(0)?,
            username: row.get(1)?,
            status: status.parse().unwrap_or(PlayerStatus::Inactive),
            verification_level: verification.parse().unwrap_or(VerificationLevel::None),
            created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
            last_login_at: last_login_at.as_deref().and_then(parse_ts),
        })
    }

    // ============================================
    // Activity records
    // ============================================

    pub fn insert_login(&self, login: &Login) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO login_sessions (player_id, ip_address, created_at) VALUES (?1, ?2, ?3)",
            params![login.player_id, login.ip_address, ts(login.created_at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_game_session(&self, session: &GameSession) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO game_sessions (player_id, game_type, started_at, ended_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.player_id,
                session.game_type,
                ts(session.started_at),
                session.ended_at.map(ts),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_game_round(&self, round: &GameRound) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO game_rounds (session_id, bet_amount, win_amount, result, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                round.session_id,
                round.bet_amount,
                round.win_amount,
                round.result.as_str(),
                ts(round.played_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_transaction(&self, tx: &Transaction) -> Result<i64> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO transactions (player_id, transaction_type, amount, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                tx.player_id,
                tx.transaction_type.as_str(),
                tx.amount,
                tx.status.as_str(),
                ts(tx.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ============================================
    // Analysis history
    // ============================================

    /// Append one analysis snapshot to its history table.
    pub fn insert_analysis(&self, record: &AnalysisRecord) -> Result<i64> {
        let conn = self.connection()?;
        let data = serde_json::to_string(&record.data)?;
        let created_at = ts(record.created_at);

        match record.kind {
            AnalysisKind::GamePreference => conn.execute(
                r#"
                INSERT INTO game_preference_analyses
                    (player_id, time_range, favorite_game_type, analysis_data, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    record.player_id,
                    record.time_range,
                    record.label,
                    data,
                    created_at
                ],
            )?,
            AnalysisKind::SpendingHabits => conn.execute(
                r#"
                INSERT INTO spending_habits_analyses
                    (player_id, time_range, spending_level, analysis_data, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    record.player_id,
                    record.time_range,
                    record.label,
                    data,
                    created_at
                ],
            )?,
            AnalysisKind::ValueScore => conn.execute(
                r#"
                INSERT INTO value_score_analyses
                    (player_id, time_range, overall_score, value_category, analysis_data, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.player_id,
                    record.time_range,
                    record.score.unwrap_or(0.0),
                    record.label.as_deref().unwrap_or("Low"),
                    data,
                    created_at
                ],
            )?,
        };

        Ok(conn.last_insert_rowid())
    }

    /// Persisted snapshots for a player, newest first.
    pub fn list_analyses(
        &self,
        kind: AnalysisKind,
        player_id: PlayerId,
        limit: usize,
    ) -> Result<Vec<StoredAnalysis>> {
        let conn = self.connection()?;
        let (label_col, score_col) = match kind {
            AnalysisKind::GamePreference => ("favorite_game_type", "NULL"),
            AnalysisKind::SpendingHabits => ("spending_level", "NULL"),
            AnalysisKind::ValueScore => ("value_category", "overall_score"),
        };
        let sql = format!(
            r#"
            SELECT id, player_id, time_range, {label_col}, {score_col}, analysis_data, created_at
            FROM {table}
            WHERE player_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
            table = kind.table(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![player_id, limit as i64], |row| {
                let data: String = row.get(5)?;
                let created_at: String = row.get(6)?;
                Ok(StoredAnalysis {
                    id: row.get(0)?,
                    player_id: row.get(1)?,
                    time_range: row.get(2)?,
                    label: row.get(3)?,
                    score: row.get(4)?,
                    data: serde_json::from_str(&data).unwrap_or(serde_json::Value::Null),
                    created_at: parse_ts(&created_at).unwrap_or_else(Utc::now),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn player(id: PlayerId) -> Player {
        Player {
            id,
            username: format!("player{}", id),
            status: PlayerStatus::Active,
            verification_level: VerificationLevel::Phone,
            created_at: Utc.with_ymd_and_hms(2023, 1, 15, 8, 30, 0).unwrap(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_timestamp_format_sorts() {
        let a = ts(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let b = ts(Utc.with_ymd_and_hms(2024, 11, 2, 3, 4, 5).unwrap());
        assert_eq!(a, "2024-01-02T03:04:05Z");
        assert!(a < b);
        assert_eq!(parse_ts(&a).map(ts), Some(a));
    }

    #[test]
    fn test_player_roundtrip() {
        let db = test_db();
        db.insert_player(&player(7)).unwrap();

        let loaded = db.get_player(7).unwrap().unwrap();
        assert_eq!(loaded.username, "player7");
        assert_eq!(loaded.verification_level, VerificationLevel::Phone);
        assert_eq!(loaded.created_at, player(7).created_at);
        assert!(loaded.last_login_at.is_none());

        assert!(db.get_player(8).unwrap().is_none());
    }

    #[test]
    fn test_round_requires_session() {
        let db = test_db();
        let err = db.insert_game_round(&GameRound {
            session_id: 999,
            bet_amount: 10.0,
            win_amount: 0.0,
            result: RoundResult::Loss,
            played_at: Utc::now(),
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_analysis_history_appends() {
        let db = test_db();
        db.insert_player(&player(1)).unwrap();

        for score in [42.0, 77.5] {
            let record = AnalysisRecord::from_analysis(
                AnalysisKind::ValueScore,
                1,
                "90d",
                &serde_json::json!({ "overall_score": score }),
                Utc::now(),
            )
            .unwrap()
            .with_label("High")
            .with_score(score);
            db.insert_analysis(&record).unwrap();
        }

        let history = db.list_analyses(AnalysisKind::ValueScore, 1, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, Some(77.5));
        assert_eq!(history[1].data["overall_score"], 42.0);
    }
}
