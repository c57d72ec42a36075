//! Aggregation store interface
//!
//! Analyzers never touch SQL directly. They receive a [`PlayerStore`] and ask
//! it for typed aggregates scoped to a player and an [`AnalysisWindow`].
//! [`crate::Database`] is the production implementation; tests can supply
//! their own.
//!
//! Zero matching rows always yields zero-valued aggregates, never an error.

use super::persistence::AnalysisRecord;
use super::window::AnalysisWindow;
use crate::error::Result;
use crate::types::{Player, PlayerId, TransactionType};

// ============================================
// Game aggregates
// ============================================

/// Completed sessions of one game type, joined with their rounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTypeAggregate {
    pub game_type: String,
    /// Completed sessions
    pub games_played: i64,
    pub total_minutes: f64,
    pub average_minutes: f64,
    pub total_bet: f64,
    pub total_win: f64,
    pub rounds: i64,
    pub winning_rounds: i64,
}

/// Sessions of one game type started in one hour of day (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyGameCount {
    pub hour: u32,
    pub game_type: String,
    pub games: i64,
}

/// Sessions of one game type started on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyGameCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub game_type: String,
    pub games: i64,
    pub minutes: f64,
}

/// A single round's stake, tagged with its game type.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundStake {
    pub game_type: String,
    pub bet_amount: f64,
    pub win_amount: f64,
}

// ============================================
// Spending aggregates
// ============================================

/// Transactions on one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySpending {
    pub date: String,
    pub transactions: i64,
    pub amount: f64,
}

/// Min/max/avg/sum over positive amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmountSummary {
    pub count: i64,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// Count and total for one bucket of a histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountTotal {
    pub count: i64,
    pub total: f64,
}

/// Per-type share of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTotal {
    pub transaction_type: TransactionType,
    pub count: i64,
    pub total: f64,
    pub average: f64,
}

// ============================================
// Value-score aggregates
// ============================================

/// Login activity in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoginStats {
    pub login_days: i64,
    pub total_logins: i64,
    pub unique_hours: i64,
    pub unique_ips: i64,
}

/// Game sessions started in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameActivity {
    pub total_games: i64,
    pub average_session_minutes: f64,
    pub unique_game_types: i64,
}

/// Round stakes placed in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BetStats {
    pub rounds: i64,
    pub total_bet: f64,
    pub total_win: f64,
    pub average_bet: f64,
    pub max_bet: f64,
}

impl BetStats {
    /// Platform gaming revenue (`bets - wins`).
    pub fn house_net(&self) -> f64 {
        self.total_bet - self.total_win
    }
}

/// Ledger totals by type in a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerTotals {
    pub deposit_total: f64,
    pub deposit_count: i64,
    pub completed_deposits: i64,
    /// Deposits above 10,000
    pub large_deposits: i64,
    pub withdrawal_total: f64,
    pub withdrawal_count: i64,
    pub fee_total: f64,
}

impl LedgerTotals {
    pub fn average_deposit(&self) -> f64 {
        if self.deposit_count > 0 {
            self.deposit_total / self.deposit_count as f64
        } else {
            0.0
        }
    }
}

/// Position of a score among active players' latest persisted value scores.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreRank {
    /// Active players whose latest overall score is strictly lower
    pub lower_count: i64,
    pub active_players: i64,
}

// ============================================
// Store trait
// ============================================

/// Read-mostly access to the platform store.
///
/// Implementations must be safe to share across request workers. Every
/// method is scoped by player and window; none mutates source records.
pub trait PlayerStore: Send + Sync {
    /// Existence probe. `Ok(None)` when no such player.
    fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>>;

    // --- games ---

    /// Per-game-type statistics for completed sessions, excluding types with
    /// fewer than `min_games` sessions. Ordered by games played, descending.
    fn game_type_aggregates(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        min_games: u32,
    ) -> Result<Vec<GameTypeAggregate>>;

    fn hourly_game_counts(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
    ) -> Result<Vec<HourlyGameCount>>;

    fn daily_game_counts(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
    ) -> Result<Vec<DailyGameCount>>;

    fn round_stakes(&self, player_id: PlayerId, window: AnalysisWindow)
        -> Result<Vec<RoundStake>>;

    fn game_activity(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<GameActivity>;

    fn bet_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<BetStats>;

    // --- logins ---

    fn login_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LoginStats>;

    // --- ledger ---

    /// Per-day count and amount of transactions of the given types.
    fn daily_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<DailySpending>>;

    /// Summary over transactions of the given types with a positive amount.
    fn amount_summary(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<AmountSummary>;

    /// Positive amounts bucketed as small (≤100), medium (≤500), large (≤1000)
    /// and very large, in that order.
    fn amount_buckets(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 4]>;

    /// Transactions by UTC hour of day.
    fn hourly_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 24]>;

    /// Transactions by day of week (0 = Sunday).
    fn weekday_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 7]>;

    fn channel_totals(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<ChannelTotal>>;

    /// Count of transactions of the given types with amount above `threshold`.
    fn large_transaction_count(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
        threshold: f64,
    ) -> Result<i64>;

    /// Distinct calendar days with any transaction of the given types.
    fn active_spending_days(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<i64>;

    fn ledger_totals(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LedgerTotals>;

    /// Individual deposit amounts (for dispersion measures).
    fn deposit_amounts(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<f64>>;

    // --- history ---

    /// Rank `overall_score` against every active player's latest persisted
    /// value score.
    fn value_score_rank(&self, overall_score: f64) -> Result<ScoreRank>;

    /// Append one analysis snapshot. Returns the new row id.
    fn save_analysis(&self, record: &AnalysisRecord) -> Result<i64>;
}
