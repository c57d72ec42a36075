//! Integration tests for the playerscope analyzers
//!
//! Each test seeds a file-backed SQLite database in a temp dir and runs the
//! analyzers against it with a fixed clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use playerscope_core::analytics::persistence::{AnalysisKind, AnalysisRecord};
use playerscope_core::analytics::store::*;
use playerscope_core::analytics::{
    AnalysisWindow, GamePreferenceAnalyzer, GamePreferenceRequest, PlayerStore,
    SpendingHabitsAnalyzer, TimeRange, ValueScoreAnalyzer, ValueScoreRequest,
};
use playerscope_core::config::AnalyticsConfig;
use playerscope_core::types::*;
use playerscope_core::{Database, Error, Result};
use std::sync::Arc;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Open a migrated database in a fresh temp dir.
fn test_db() -> (TempDir, Arc<Database>) {
    playerscope_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("playerscope.db")).unwrap();
    db.migrate().unwrap();
    (dir, Arc::new(db))
}

fn config(persist: bool) -> AnalyticsConfig {
    AnalyticsConfig {
        persist_results: persist,
        ..AnalyticsConfig::default()
    }
}

fn add_player(db: &Database, id: PlayerId, tenure_days: i64) {
    db.insert_player(&Player {
        id,
        username: format!("player{}", id),
        status: PlayerStatus::Active,
        verification_level: VerificationLevel::Phone,
        created_at: now() - Duration::days(tenure_days),
        last_login_at: Some(now() - Duration::days(1)),
    })
    .unwrap();
}

/// Insert a completed 30-minute session with one losing round of `bet`.
fn add_session(db: &Database, player_id: PlayerId, game_type: &str, started_at: DateTime<Utc>, bet: f64) {
    let session_id = db
        .insert_game_session(&GameSession {
            player_id,
            game_type: game_type.to_string(),
            started_at,
            ended_at: Some(started_at + Duration::minutes(30)),
        })
        .unwrap();
    db.insert_game_round(&GameRound {
        session_id,
        bet_amount: bet,
        win_amount: 0.0,
        result: RoundResult::Loss,
        played_at: started_at + Duration::minutes(5),
    })
    .unwrap();
}

fn add_deposit(db: &Database, player_id: PlayerId, amount: f64, at: DateTime<Utc>) {
    db.insert_transaction(&Transaction {
        player_id,
        transaction_type: TransactionType::Deposit,
        amount,
        status: TransactionStatus::Completed,
        created_at: at,
    })
    .unwrap();
}

// ============================================
// Empty and missing players
// ============================================

#[test]
fn test_player_without_activity() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 10);

    let games = GamePreferenceAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &GamePreferenceRequest::new(TimeRange::Days30), now())
        .unwrap();
    assert_eq!(games.total_games_played, 0);
    assert_eq!(games.unique_game_types, 0);
    assert_eq!(games.favorite_game_type, "");
    assert_eq!(games.time_distribution.hourly_preference.len(), 24);
    assert!(games.game_type_stats.is_empty());

    let spending = SpendingHabitsAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, now())
        .unwrap();
    assert_eq!(spending.spending_amount.total_amount, 0.0);
    assert_eq!(spending.spending_frequency.total_transactions, 0);
    assert!(spending.spending_risk.error.is_none());

    let value = ValueScoreAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &ValueScoreRequest::default(), now())
        .unwrap();
    assert_eq!(value.activity_score.score, 0.0);
    assert_eq!(value.spending_score.score, 0.0);
    assert_eq!(value.profitability_score.score, 0.0);
    assert_eq!(value.value_category, "Low");
}

#[test]
fn test_missing_player_is_not_found() {
    let (_dir, db) = test_db();

    let games = GamePreferenceAnalyzer::new(db.clone(), config(true))
        .analyze_at(404, &GamePreferenceRequest::new(TimeRange::Days30), now());
    assert!(matches!(games, Err(Error::PlayerNotFound(404))));

    let spending = SpendingHabitsAnalyzer::new(db.clone(), config(true)).analyze_at(404, now());
    assert!(matches!(spending, Err(Error::PlayerNotFound(404))));

    let value = ValueScoreAnalyzer::new(db.clone(), config(true))
        .analyze_at(404, &ValueScoreRequest::default(), now());
    assert!(matches!(value, Err(Error::PlayerNotFound(404))));

    // nothing persisted for a missing player
    assert!(db
        .list_analyses(AnalysisKind::ValueScore, 404, 10)
        .unwrap()
        .is_empty());
}

// ============================================
// Game preference
// ============================================

#[test]
fn test_single_game_type_is_focused() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 200);
    for i in 0..50 {
        add_session(&db, 1, "slots", now() - Duration::hours(2 + i * 12), 10.0);
    }

    let analysis = GamePreferenceAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &GamePreferenceRequest::new(TimeRange::Days30), now())
        .unwrap();

    assert_eq!(analysis.total_games_played, 50);
    assert_eq!(analysis.favorite_game_type, "slots");
    assert_eq!(analysis.preference_metrics.diversity_index, 0.0);
    assert_eq!(analysis.preference_metrics.specialization_level, "focused");
    assert_eq!(analysis.preference_metrics.exploration_tendency, "settler");
    assert_eq!(analysis.game_type_stats[0].participation_rate, 100.0);
}

#[test]
fn test_participation_rates_sum_to_100() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 200);
    for i in 0..12 {
        add_session(&db, 1, "poker", now() - Duration::hours(3 + i * 20), 25.0);
    }
    for i in 0..18 {
        add_session(&db, 1, "roulette", now() - Duration::hours(5 + i * 20), 5.0);
    }
    // below the minimum game count, filtered out
    add_session(&db, 1, "bingo", now() - Duration::hours(7), 1.0);

    let analysis = GamePreferenceAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &GamePreferenceRequest::new(TimeRange::Days30), now())
        .unwrap();

    assert_eq!(analysis.unique_game_types, 2);
    assert_eq!(analysis.favorite_game_type, "roulette");
    let total: f64 = analysis
        .game_type_stats
        .iter()
        .map(|s| s.participation_rate)
        .sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert!(analysis.preference_metrics.diversity_index > 0.9);
}

#[test]
fn test_game_preference_persists_snapshot() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 200);
    for i in 0..10 {
        add_session(&db, 1, "blackjack", now() - Duration::hours(1 + i), 10.0);
    }

    GamePreferenceAnalyzer::new(db.clone(), config(true))
        .analyze_at(1, &GamePreferenceRequest::new(TimeRange::Days7), now())
        .unwrap();

    let history = db
        .list_analyses(AnalysisKind::GamePreference, 1, 10)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].label.as_deref(), Some("blackjack"));
    assert_eq!(history[0].time_range, "7d");
    assert_eq!(history[0].data["favorite_game_type"], "blackjack");
}

// ============================================
// Value score
// ============================================

#[test]
fn test_long_tenured_regular_is_loyal() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 400);
    for i in 0..60 {
        add_session(&db, 1, "slots", now() - Duration::days(i) - Duration::hours(1), 20.0);
    }

    let analysis = ValueScoreAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &ValueScoreRequest::default(), now())
        .unwrap();

    assert_eq!(analysis.loyalty_score.tenure_days, 400);
    assert_eq!(analysis.loyalty_score.retention_category, "loyal");
    assert_eq!(analysis.loyalty_score.churn_probability, 0.1);
    assert!(analysis.trend_analysis.is_some());
    assert!(analysis.retention_risk.is_some());
}

#[test]
fn test_value_score_is_deterministic() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 120);
    for i in 0..15 {
        add_session(&db, 1, "poker", now() - Duration::days(i * 3) - Duration::hours(2), 50.0);
        add_deposit(&db, 1, 200.0, now() - Duration::days(i * 4) - Duration::hours(3));
    }

    let analyzer = ValueScoreAnalyzer::new(db.clone(), config(false));
    let request = ValueScoreRequest::default();
    let first = analyzer.analyze_at(1, &request, now()).unwrap();
    let second = analyzer.analyze_at(1, &request, now()).unwrap();

    assert_eq!(first, second);
    assert!(first.overall_score > 0.0);
    assert!(first.spending_score.total_spending > 0.0);
}

#[test]
fn test_value_score_without_details() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 30);

    let request = ValueScoreRequest {
        time_range: TimeRange::Days30,
        include_details: Some(false),
        weight_config: None,
    };
    let analysis = ValueScoreAnalyzer::new(db.clone(), config(false))
        .analyze_at(1, &request, now())
        .unwrap();

    assert!(analysis.trend_analysis.is_none());
    assert!(analysis.competitor_analysis.is_none());
    assert!(analysis.retention_risk.is_none());
    assert!(analysis.value_potential.is_none());
    assert!(!analysis.recommendations.is_empty());
}

#[test]
fn test_value_score_rejects_week_range() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 30);

    let request = ValueScoreRequest {
        time_range: TimeRange::Days7,
        include_details: None,
        weight_config: None,
    };
    let result = ValueScoreAnalyzer::new(db.clone(), config(false)).analyze_at(1, &request, now());
    assert!(matches!(result, Err(Error::InvalidRequest(_))));
}

#[test]
fn test_percentile_against_persisted_scores() {
    let (_dir, db) = test_db();
    for id in 1..=4 {
        add_player(&db, id, 30);
        let record = AnalysisRecord::from_analysis(
            AnalysisKind::ValueScore,
            id,
            "90d",
            &serde_json::json!({}),
            now() - Duration::days(1),
        )
        .unwrap()
        .with_label("Low")
        .with_score(id as f64 * 10.0);
        db.insert_analysis(&record).unwrap();
    }

    // an inactive, phone-verified player lands just above the lowest row
    let analysis = ValueScoreAnalyzer::new(db.clone(), config(true))
        .analyze_at(1, &ValueScoreRequest::default(), now())
        .unwrap();
    let competitor = analysis.competitor_analysis.unwrap();
    assert!(competitor.percentile > 0.0);
    assert!(competitor.percentile <= 100.0);

    let history = db.list_analyses(AnalysisKind::ValueScore, 1, 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].label.as_deref(), Some(analysis.value_category.as_str()));
}

// ============================================
// Degraded store
// ============================================

/// Delegates to a real database but fails the spending time pattern queries
/// and every history write.
struct FlakyStore(Arc<Database>);

fn broken<T>() -> Result<T> {
    Err(Error::Database(rusqlite::Error::InvalidQuery))
}

impl PlayerStore for FlakyStore {
    fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        self.0.find_player(player_id)
    }
    fn game_type_aggregates(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        min_games: u32,
    ) -> Result<Vec<GameTypeAggregate>> {
        self.0.game_type_aggregates(player_id, window, min_games)
    }
    fn hourly_game_counts(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<HourlyGameCount>> {
        self.0.hourly_game_counts(player_id, window)
    }
    fn daily_game_counts(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<DailyGameCount>> {
        self.0.daily_game_counts(player_id, window)
    }
    fn round_stakes(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<RoundStake>> {
        self.0.round_stakes(player_id, window)
    }
    fn game_activity(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<GameActivity> {
        self.0.game_activity(player_id, window)
    }
    fn bet_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<BetStats> {
        self.0.bet_stats(player_id, window)
    }
    fn login_stats(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LoginStats> {
        self.0.login_stats(player_id, window)
    }
    fn daily_spending(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<DailySpending>> {
        self.0.daily_spending(player_id, window, types)
    }
    fn amount_summary(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<AmountSummary> {
        self.0.amount_summary(player_id, window, types)
    }
    fn amount_buckets(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<[CountTotal; 4]> {
        self.0.amount_buckets(player_id, window, types)
    }
    fn hourly_spending(
        &self,
        _player_id: PlayerId,
        _window: AnalysisWindow,
        _types: &[TransactionType],
    ) -> Result<[CountTotal; 24]> {
        broken()
    }
    fn weekday_spending(
        &self,
        _player_id: PlayerId,
        _window: AnalysisWindow,
        _types: &[TransactionType],
    ) -> Result<[CountTotal; 7]> {
        broken()
    }
    fn channel_totals(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<Vec<ChannelTotal>> {
        self.0.channel_totals(player_id, window, types)
    }
    fn large_transaction_count(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
        threshold: f64,
    ) -> Result<i64> {
        self.0.large_transaction_count(player_id, window, types, threshold)
    }
    fn active_spending_days(
        &self,
        player_id: PlayerId,
        window: AnalysisWindow,
        types: &[TransactionType],
    ) -> Result<i64> {
        self.0.active_spending_days(player_id, window, types)
    }
    fn ledger_totals(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<LedgerTotals> {
        self.0.ledger_totals(player_id, window)
    }
    fn deposit_amounts(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<Vec<f64>> {
        self.0.deposit_amounts(player_id, window)
    }
    fn value_score_rank(&self, _overall_score: f64) -> Result<ScoreRank> {
        broken()
    }
    fn save_analysis(&self, _record: &AnalysisRecord) -> Result<i64> {
        broken()
    }
}

#[test]
fn test_spending_sections_degrade_independently() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 60);
    add_deposit(&db, 1, 250.0, now() - Duration::days(2));
    add_deposit(&db, 1, 1500.0, now() - Duration::days(5));

    let store: Arc<dyn PlayerStore> = Arc::new(FlakyStore(db.clone()));
    let analysis = SpendingHabitsAnalyzer::new(store, config(true))
        .analyze_at(1, now())
        .unwrap();

    assert!(analysis.spending_time_pattern.error.is_some());
    assert!(analysis.spending_frequency.error.is_none());
    assert!(analysis.spending_amount.error.is_none());
    assert_eq!(analysis.spending_amount.total_amount, 1750.0);
    assert_eq!(analysis.spending_amount.amount_ranges.very_large.count, 1);
    assert!(analysis.spending_capacity.error.is_none());
}

#[test]
fn test_failed_persistence_and_rank_do_not_fail_value_score() {
    let (_dir, db) = test_db();
    add_player(&db, 1, 60);

    let store: Arc<dyn PlayerStore> = Arc::new(FlakyStore(db.clone()));
    let analysis = ValueScoreAnalyzer::new(store, config(true))
        .analyze_at(1, &ValueScoreRequest::default(), now())
        .unwrap();

    // percentile falls back to the fixed buckets
    let competitor = analysis.competitor_analysis.unwrap();
    assert_eq!(competitor.percentile, 25.0);
    assert_eq!(competitor.similar_players, 0);
}
