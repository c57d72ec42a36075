//! SQLite implementation of [`PlayerStore`]
//!
//! All windows are half-open: `ts >= start AND ts < end`. Timestamps are
//! stored as fixed-width UTC RFC 3339 text, so string comparison is time order
//! and `strftime`/`julianday` parse them directly.

use super::repo::{ts, Database};
use crate::analytics::persistence::AnalysisRecord;
use crate::analytics::store::*;
use crate::analytics::window::AnalysisWindow;
use crate::error::Result;
use crate::types::{Player, PlayerId, TransactionType};
use rusqlite::params;

/// SQL list literal for an `IN (...)` clause.
///
/// Values come from [`TransactionType::as_str`], never from callers.
fn type_list(types: &[TransactionType]) -> String {
    if types.is_empty() {
        return "NULL".to_string();
    }
    types
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

fn bounds(window: AnalysisWindow) -> (String, String) {
    (ts(window.start), ts(window.end))
}

const SESSION_MINUTES: &str = "(julianday(ended_at) - julianday(started_at)) * 1440.0";

impl PlayerStore for Database {
    fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        self.get_player(player_id)
    }

    // ============================================
    // Games
    // ============================================

    fn game_type_aggregates(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        min_games: u32,
    ) -> Result<Vec<GameTypeAggregate>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        // Rounds are rolled up per session first so a session's duration is
        // counted once regardless of how many rounds it holds.
        let sql = format!(
            r#"
            WITH sessions AS (
                SELECT id, game_type, {SESSION_MINUTES} AS minutes
                FROM game_sessions
                WHERE player_id = ?1
                  AND ended_at IS NOT NULL
                  AND started_at >= ?2 AND started_at < ?3
            ),
            round_totals AS (
                SELECT r.session_id,
                       COUNT(*) AS rounds,
                       SUM(r.bet_amount) AS bet,
                       SUM(r.win_amount) AS win,
                       SUM(CASE WHEN r.result = 'win' THEN 1 ELSE 0 END) AS wins
                FROM game_rounds r
                JOIN sessions s ON s.id = r.session_id
                GROUP BY r.session_id
            )
            SELECT s.game_type,
                   COUNT(*) AS games_played,
                   COALESCE(SUM(s.minutes), 0),
                   COALESCE(AVG(s.minutes), 0),
                   COALESCE(SUM(rt.bet), 0),
                   COALESCE(SUM(rt.win), 0),
                   COALESCE(SUM(rt.rounds), 0),
                   COALESCE(SUM(rt.wins), 0)
            FROM sessions s
            LEFT JOIN round_totals rt ON rt.session_id = s.id
            GROUP BY s.game_type
            HAVING COUNT(*) >= ?4
            ORDER BY games_played DESC, s.game_type
            "#
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![player_id, start, end, min_games], |row| {
                Ok(GameTypeAggregate {
                    game_type: row.get(0)?,
                    games_played: row.get(1)?,
                    total_minutes: row.get(2)?,
                    average_minutes: row.get(3)?,
                    total_bet: row.get(4)?,
                    total_win: row.get(5)?,
                    rounds: row.get(6)?,
                    winning_rounds: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn hourly_game_counts(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
    ) -> Result<Vec<HourlyGameCount>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let mut stmt = conn.prepare(
            r#"
            SELECT CAST(strftime('%H', started_at) AS INTEGER) AS hour,
                   game_type,
                   COUNT(*) AS games
            FROM game_sessions
            WHERE player_id = ?1 AND started_at >= ?2 AND started_at < ?3
            GROUP BY hour, game_type
            ORDER BY hour, games DESC, game_type
            "#,
        )?;
        let rows = stmt
            .query_map(params![player_id, start, end], |row| {
                Ok(HourlyGameCount {
                    hour: row.get(0)?,
                    game_type: row.get(1)?,
                    games: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn daily_game_counts(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
    ) -> Result<Vec<DailyGameCount>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT date(started_at) AS day,
                   game_type,
                   COUNT(*),
                   COALESCE(SUM(CASE WHEN ended_at IS NOT NULL THEN {SESSION_MINUTES} ELSE 0 END), 0)
            FROM game_sessions
            WHERE player_id = ?1 AND started_at >= ?2 AND started_at < ?3
            GROUP BY day, game_type
            ORDER BY day, game_type
            "#
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![player_id, start, end], |row| {
                Ok(DailyGameCount {
                    date: row.get(0)?,
                    game_type: row.get(1)?,
                    games: row.get(2)?,
                    minutes: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn round_stakes(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
    ) -> Result<Vec<RoundStake>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let mut stmt = conn.prepare(
            r#"
            SELECT s.game_type, r.bet_amount, r.win_amount
            FROM game_rounds r
            JOIN game_sessions s ON s.id = r.session_id
            WHERE s.player_id = ?1 AND s.started_at >= ?2 AND s.started_at < ?3
            ORDER BY s.game_type, r.id
            "#,
        )?;
        let rows = stmt
            .query_map(params![player_id, start, end], |row| {
                Ok(RoundStake {
                    game_type: row.get(0)?,
                    bet_amount: row.get(1)?,
                    win_amount: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn game_activity(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<GameActivity> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT COUNT(*),
                   COALESCE(AVG(CASE WHEN ended_at IS NOT NULL THEN {SESSION_MINUTES} END), 0),
                   COUNT(DISTINCT game_type)
            FROM game_sessions
            WHERE player_id = ?1 AND started_at >= ?2 AND started_at < ?3
            "#
        );

        let activity = conn.query_row(&sql, params![player_id, start, end], |row| {
            Ok(GameActivity {
                total_games: row.get(0)?,
                average_session_minutes: row.get(1)?,
                unique_game_types: row.get(2)?,
            })
        })?;

        Ok(activity)
    }

    fn bet_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<BetStats> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let stats = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(r.bet_amount), 0),
                   COALESCE(SUM(r.win_amount), 0),
                   COALESCE(AVG(r.bet_amount), 0),
                   COALESCE(MAX(r.bet_amount), 0)
            FROM game_rounds r
            JOIN game_sessions s ON s.id = r.session_id
            WHERE s.player_id = ?1 AND r.played_at >= ?2 AND r.played_at < ?3
            "#,
            params![player_id, start, end],
            |row| {
                Ok(BetStats {
                    rounds: row.get(0)?,
                    total_bet: row.get(1)?,
                    total_win: row.get(2)?,
                    average_bet: row.get(3)?,
                    max_bet: row.get(4)?,
                })
            },
        )?;

        Ok(stats)
    }

    // ============================================
    // Logins
    // ============================================

    fn login_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LoginStats> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let stats = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT date(created_at)),
                   COUNT(*),
                   COUNT(DISTINCT strftime('%H', created_at)),
                   COUNT(DISTINCT ip_address)
            FROM login_sessions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
            params![player_id, start, end],
            |row| {
                Ok(LoginStats {
                    login_days: row.get(0)?,
                    total_logins: row.get(1)?,
                    unique_hours: row.get(2)?,
                    unique_ips: row.get(3)?,
                })
            },
        )?;

        Ok(stats)
    }

    // ============================================
    // Ledger
    // ============================================

    fn daily_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<DailySpending>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT date(created_at) AS day, COUNT(*), COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({})
            GROUP BY day
            ORDER BY day DESC
            "#,
            type_list(types)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![player_id, start, end], |row| {
                Ok(DailySpending {
                    date: row.get(0)?,
                    transactions: row.get(1)?,
                    amount: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn amount_summary(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<AmountSummary> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(amount), 0),
                   COALESCE(MIN(amount), 0),
                   COALESCE(MAX(amount), 0),
                   COALESCE(AVG(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({}) AND amount > 0
            "#,
            type_list(types)
        );

        let summary = conn.query_row(&sql, params![player_id, start, end], |row| {
            Ok(AmountSummary {
                count: row.get(0)?,
                total: row.get(1)?,
                min: row.get(2)?,
                max: row.get(3)?,
                average: row.get(4)?,
            })
        })?;

        Ok(summary)
    }

    fn amount_buckets(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 4]> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT CASE
                       WHEN amount <= 100 THEN 0
                       WHEN amount <= 500 THEN 1
                       WHEN amount <= 1000 THEN 2
                       ELSE 3
                   END AS bucket,
                   COUNT(*),
                   COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({}) AND amount > 0
            GROUP BY bucket
            "#,
            type_list(types)
        );

        let mut buckets = [CountTotal::default(); 4];
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![player_id, start, end], |row| {
            Ok((row.get::<_, usize>(0)?, row.get(1)?, row.get(2)?))
        })?;
        for row in rows {
            let (bucket, count, total) = row?;
            if let Some(slot) = buckets.get_mut(bucket) {
                *slot = CountTotal { count, total };
            }
        }

        Ok(buckets)
    }

    fn hourly_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 24]> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT CAST(strftime('%H', created_at) AS INTEGER) AS hour,
                   COUNT(*),
                   COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({})
            GROUP BY hour
            "#,
            type_list(types)
        );

        let mut hours = [CountTotal::default(); 24];
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![player_id, start, end], |row| {
            Ok((row.get::<_, usize>(0)?, row.get(1)?, row.get(2)?))
        })?;
        for row in rows {
            let (hour, count, total) = row?;
            if let Some(slot) = hours.get_mut(hour) {
                *slot = CountTotal { count, total };
            }
        }

        Ok(hours)
    }

    fn weekday_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 7]> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT CAST(strftime('%w', created_at) AS INTEGER) AS weekday,
                   COUNT(*),
                   COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({})
            GROUP BY weekday
            "#,
            type_list(types)
        );

        let mut days = [CountTotal::default(); 7];
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![player_id, start, end], |row| {
            Ok((row.get::<_, usize>(0)?, row.get(1)?, row.get(2)?))
        })?;
        for row in rows {
            let (weekday, count, total) = row?;
            if let Some(slot) = days.get_mut(weekday) {
                *slot = CountTotal { count, total };
            }
        }

        Ok(days)
    }

    fn channel_totals(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<ChannelTotal>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT transaction_type, COUNT(*), COALESCE(SUM(amount), 0), COALESCE(AVG(amount), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({})
            GROUP BY transaction_type
            ORDER BY COUNT(*) DESC, transaction_type
            "#,
            type_list(types)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![player_id, start, end], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(kind, count, total, average)| {
                kind.parse::<TransactionType>()
                    .ok()
                    .map(|transaction_type| ChannelTotal {
                        transaction_type,
                        count,
                        total,
                        average,
                    })
            })
            .collect())
    }

    fn large_transaction_count(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
        threshold: f64,
    ) -> Result<i64> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({}) AND amount > ?4
            "#,
            type_list(types)
        );

        let count = conn.query_row(&sql, params![player_id, start, end, threshold], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    fn active_spending_days(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<i64> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let sql = format!(
            r#"
            SELECT COUNT(DISTINCT date(created_at))
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type IN ({})
            "#,
            type_list(types)
        );

        let days = conn.query_row(&sql, params![player_id, start, end], |row| row.get(0))?;
        Ok(days)
    }

    fn ledger_totals(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LedgerTotals> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let totals = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN transaction_type = 'deposit' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'deposit' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'deposit' AND status = 'completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'deposit' AND amount > 10000 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'withdrawal' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'withdrawal' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN transaction_type = 'fee' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
            params![player_id, start, end],
            |row| {
                Ok(LedgerTotals {
                    deposit_total: row.get(0)?,
                    deposit_count: row.get(1)?,
                    completed_deposits: row.get(2)?,
                    large_deposits: row.get(3)?,
                    withdrawal_total: row.get(4)?,
                    withdrawal_count: row.get(5)?,
                    fee_total: row.get(6)?,
                })
            },
        )?;

        Ok(totals)
    }

    fn deposit_amounts(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<f64>> {
        let conn = self.connection()?;
        let (start, end) = bounds(window);

        let mut stmt = conn.prepare(
            r#"
            SELECT amount
            FROM transactions
            WHERE player_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND transaction_type = 'deposit'
            ORDER BY created_at, id
            "#,
        )?;
        let amounts = stmt
            .query_map(params![player_id, start, end], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;

        Ok(amounts)
    }

    // ============================================
    // History
    // ============================================

    fn value_score_rank(&self, overall_score: f64) -> Result<ScoreRank> {
        let conn = self.connection()?;

        let rank = conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*)
                 FROM players p
                 JOIN value_score_analyses v ON v.player_id = p.id
                 WHERE p.status = 'active'
                   AND v.id = (SELECT MAX(id) FROM value_score_analyses WHERE player_id = p.id)
                   AND v.overall_score < ?1),
                (SELECT COUNT(*) FROM players WHERE status = 'active')
            "#,
            [overall_score],
            |row| {
                Ok(ScoreRank {
                    lower_count: row.get(0)?,
                    active_players: row.get(1)?,
                })
            },
        )?;

        Ok(rank)
    }

    fn save_analysis(&self, record: &AnalysisRecord) -> Result<i64> {
        self.insert_analysis(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::persistence::AnalysisKind;
    use crate::types::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        for id in [1, 2, 3] {
            db.insert_player(&Player {
                id,
                username: format!("p{}", id),
                status: if id == 3 {
                    PlayerStatus::Suspended
                } else {
                    PlayerStatus::Active
                },
                verification_level: VerificationLevel::Email,
                created_at: now() - Duration::days(400),
                last_login_at: None,
            })
            .unwrap();
        }
        db
    }

    fn session(db: &Database, game: &str, start: DateTime<Utc>, minutes: i64) -> i64 {
        db.insert_game_session(&GameSession {
            player_id: 1,
            game_type: game.to_string(),
            started_at: start,
            ended_at: Some(start + Duration::minutes(minutes)),
        })
        .unwrap()
    }

    fn round(db: &Database, session_id: i64, bet: f64, win: f64, at: DateTime<Utc>) {
        db.insert_game_round(&GameRound {
            session_id,
            bet_amount: bet,
            win_amount: win,
            result: if win > bet {
                RoundResult::Win
            } else {
                RoundResult::Loss
            },
            played_at: at,
        })
        .unwrap();
    }

    fn tx(db: &Database, kind: TransactionType, amount: f64, at: DateTime<Utc>) {
        db.insert_transaction(&Transaction {
            player_id: 1,
            transaction_type: kind,
            amount,
            status: TransactionStatus::Completed,
            created_at: at,
        })
        .unwrap();
    }

    fn window() -> AnalysisWindow {
        AnalysisWindow::trailing(now(), 30)
    }

    #[test]
    fn test_empty_player_yields_zero_aggregates() {
        let db = seeded();
        let w = window();
        assert!(db.game_type_aggregates(1, w, 0).unwrap().is_empty());
        assert_eq!(db.game_activity(1, w).unwrap(), GameActivity::default());
        assert_eq!(db.bet_stats(1, w).unwrap(), BetStats::default());
        assert_eq!(db.login_stats(1, w).unwrap(), LoginStats::default());
        assert_eq!(db.ledger_totals(1, w).unwrap(), LedgerTotals::default());
        assert_eq!(
            db.amount_summary(1, w, &[TransactionType::Deposit]).unwrap(),
            AmountSummary::default()
        );
    }

    #[test]
    fn test_rounds_do_not_duplicate_durations() {
        let db = seeded();
        let start = now() - Duration::days(2);
        let s = session(&db, "slots", start, 30);
        for i in 0..3 {
            round(&db, s, 10.0, if i == 0 { 25.0 } else { 0.0 }, start);
        }
        session(&db, "slots", start + Duration::hours(1), 10);

        let aggs = db.game_type_aggregates(1, window(), 1).unwrap();
        assert_eq!(aggs.len(), 1);
        let slots = &aggs[0];
        assert_eq!(slots.games_played, 2);
        assert!((slots.total_minutes - 40.0).abs() < 0.01);
        assert!((slots.average_minutes - 20.0).abs() < 0.01);
        assert_eq!(slots.rounds, 3);
        assert_eq!(slots.winning_rounds, 1);
        assert!((slots.total_bet - 30.0).abs() < 1e-9);
        assert!((slots.total_win - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_games_filter_and_open_sessions() {
        let db = seeded();
        let start = now() - Duration::days(1);
        session(&db, "poker", start, 15);
        session(&db, "poker", start, 15);
        session(&db, "roulette", start, 15);
        db.insert_game_session(&GameSession {
            player_id: 1,
            game_type: "roulette".to_string(),
            started_at: start,
            ended_at: None,
        })
        .unwrap();

        let aggs = db.game_type_aggregates(1, window(), 2).unwrap();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].game_type, "poker");

        // open sessions still count as activity
        assert_eq!(db.game_activity(1, window()).unwrap().total_games, 4);
    }

    #[test]
    fn test_window_is_half_open() {
        let db = seeded();
        let w = window();
        tx(&db, TransactionType::Deposit, 100.0, w.start);
        tx(&db, TransactionType::Deposit, 200.0, w.end);

        let totals = db.ledger_totals(1, w).unwrap();
        assert_eq!(totals.deposit_count, 1);
        assert!((totals.deposit_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_spending_histograms() {
        let db = seeded();
        // 2024-05-26 is a Sunday
        let sunday = Utc.with_ymd_and_hms(2024, 5, 26, 21, 15, 0).unwrap();
        tx(&db, TransactionType::Deposit, 50.0, sunday);
        tx(&db, TransactionType::Bet, 750.0, sunday);
        tx(&db, TransactionType::Purchase, 5000.0, sunday + Duration::days(1));
        tx(&db, TransactionType::Withdrawal, 999.0, sunday);

        let types = [
            TransactionType::Deposit,
            TransactionType::Bet,
            TransactionType::Purchase,
        ];
        let buckets = db.amount_buckets(1, window(), &types).unwrap();
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 0);
        assert_eq!(buckets[2].count, 1);
        assert_eq!(buckets[3].count, 1);

        let hours = db.hourly_spending(1, window(), &types).unwrap();
        assert_eq!(hours[21].count, 3);

        let days = db.weekday_spending(1, window(), &types).unwrap();
        assert_eq!(days[0].count, 2);
        assert_eq!(days[1].count, 1);

        assert_eq!(
            db.large_transaction_count(1, window(), &types, 1000.0)
                .unwrap(),
            1
        );
        assert_eq!(db.active_spending_days(1, window(), &types).unwrap(), 2);

        let channels = db
            .channel_totals(1, window(), &[TransactionType::Withdrawal])
            .unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].transaction_type, TransactionType::Withdrawal);
    }

    #[test]
    fn test_value_score_rank_uses_latest_active_rows() {
        let db = seeded();
        let save = |player_id: PlayerId, score: f64| {
            let record = AnalysisRecord::from_analysis(
                AnalysisKind::ValueScore,
                player_id,
                "90d",
                &serde_json::json!({}),
                now(),
            )
            .unwrap()
            .with_label("Medium")
            .with_score(score);
            db.save_analysis(&record).unwrap();
        };
        save(1, 10.0);
        save(1, 90.0); // latest for player 1
        save(2, 30.0);
        save(3, 5.0); // suspended, ignored

        let rank = db.value_score_rank(50.0).unwrap();
        assert_eq!(rank.active_players, 2);
        assert_eq!(rank.lower_count, 1);
    }
}
