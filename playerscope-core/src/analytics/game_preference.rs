//! Game preference analysis
//!
//! Answers "what, when and how does this player play" for one time range:
//! per-game-type statistics with a preference score, a time distribution
//! (hourly, daily, weekday, quarterly), per-type trends and betting habits,
//! and diversity metrics over the play-count distribution.

use super::persistence::{persist_best_effort, AnalysisKind, AnalysisRecord};
use super::scoring::{self, clamp_score, percentage};
use super::store::{DailyGameCount, GameTypeAggregate, HourlyGameCount, PlayerStore, RoundStake};
use super::window::TimeRange;
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::types::PlayerId;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

// ============================================
// Request / response
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePreferenceRequest {
    pub time_range: TimeRange,
    /// Emit chart descriptors (default true)
    #[serde(default)]
    pub include_graphs: Option<bool>,
    /// Minimum completed sessions for a game type to be reported
    #[serde(default)]
    pub min_games: Option<u32>,
}

impl GamePreferenceRequest {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            include_graphs: None,
            min_games: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePreferenceAnalysis {
    pub player_id: PlayerId,
    pub username: String,
    pub analysis_date: DateTime<Utc>,
    pub time_range: TimeRange,
    pub total_games_played: i64,
    pub unique_game_types: usize,
    pub favorite_game_type: String,
    pub game_type_stats: Vec<GameTypeStatistics>,
    pub time_distribution: TimeDistribution,
    pub trend_analysis: Vec<GameTypeTrend>,
    pub betting_habits: Vec<BettingHabit>,
    pub preference_metrics: PreferenceMetrics,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_data: Option<Vec<GraphData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTypeStatistics {
    pub game_type: String,
    pub games_played: i64,
    /// Share of reported plays, in percent
    pub participation_rate: f64,
    /// Minutes
    pub total_time_spent: f64,
    /// Minutes
    pub average_session: f64,
    pub total_bet_amount: f64,
    pub total_win_amount: f64,
    pub net_result: f64,
    pub win_rate: f64,
    pub preference_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDistribution {
    /// Always 24 entries, hour 0 first
    pub hourly_preference: Vec<HourlyPreference>,
    pub daily_preference: Vec<DailyPreference>,
    pub weekly_pattern: WeeklyPattern,
    /// Always Q1..Q4
    pub seasonal_pattern: Vec<SeasonalPattern>,
    pub peak_playing_time: String,
    pub preferred_duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPreference {
    pub hour: u32,
    pub games_played: i64,
    pub game_type_breakdown: BTreeMap<String, i64>,
    pub most_played_game: String,
    pub activity_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPreference {
    /// `YYYY-MM-DD`
    pub date: String,
    pub games_played: i64,
    pub game_type_breakdown: BTreeMap<String, i64>,
    pub most_played_game: String,
    /// Minutes
    pub total_play_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    /// Monday first
    pub weekday_pattern: Vec<WeekdayStats>,
    /// Weekend share of plays, in percent
    pub weekend_intensity: f64,
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStats {
    pub weekday: String,
    pub games_played: i64,
    pub average_session: f64,
    pub game_type_breakdown: BTreeMap<String, i64>,
    pub intensity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub period: String,
    pub games_played: i64,
    pub game_type_breakdown: BTreeMap<String, i64>,
    /// 100 means an even spread across quarters
    pub activity_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTypeTrend {
    pub game_type: String,
    pub trend_direction: String,
    /// Second half versus first half, in percent
    pub change_rate: f64,
    pub significance: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingHabit {
    pub game_type: String,
    pub average_bet_amount: f64,
    pub median_bet_amount: f64,
    /// Standard deviation of round bets
    pub bet_size_variability: f64,
    pub risk_tolerance: String,
    pub betting_strategy: String,
    pub profitability_rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceMetrics {
    pub diversity_index: f64,
    pub specialization_level: String,
    pub exploration_tendency: String,
    pub loyalty_score: f64,
    pub risk_profile: String,
    pub play_style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub graph_type: String,
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub data_points: Vec<GraphDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDataPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

const CHART_COLORS: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
];

// ============================================
// Analyzer
// ============================================

/// Builds a [`GamePreferenceAnalysis`] from a [`PlayerStore`].
#[derive(Clone)]
pub struct GamePreferenceAnalyzer {
    store: Arc<dyn PlayerStore>,
    config: AnalyticsConfig,
}

impl GamePreferenceAnalyzer {
    pub fn new(store: Arc<dyn PlayerStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn analyze(
        &self,
        player_id: PlayerId,
        request: &GamePreferenceRequest,
    ) -> Result<GamePreferenceAnalysis> {
        self.analyze_at(player_id, request, Utc::now())
    }

    /// Run the analysis with the window ending at `now`.
    pub fn analyze_at(
        &self,
        player_id: PlayerId,
        request: &GamePreferenceRequest,
        now: DateTime<Utc>,
    ) -> Result<GamePreferenceAnalysis> {
        let started = Instant::now();
        let store = self.store.as_ref();

        let player = store
            .find_player(player_id)?
            .ok_or(Error::PlayerNotFound(player_id))?;

        let window = request.time_range.window_ending(now);
        let min_games = request.min_games.unwrap_or(self.config.default_min_games);
        let include_graphs = request.include_graphs.unwrap_or(true);

        tracing::debug!(
            player_id,
            time_range = %request.time_range,
            min_games,
            "Analyzing game preference"
        );

        let aggregates = store
            .game_type_aggregates(player_id, window, min_games)
            .map_err(|e| Error::stage("game type statistics", e))?;
        let game_type_stats = game_type_statistics(&aggregates);

        let total_games_played = game_type_stats.iter().map(|s| s.games_played).sum();
        let favorite_game_type = favorite_game_type(&game_type_stats);

        let hourly = store
            .hourly_game_counts(player_id, window)
            .map_err(|e| Error::stage("time distribution", e))?;
        let daily = store
            .daily_game_counts(player_id, window)
            .map_err(|e| Error::stage("time distribution", e))?;
        let time_distribution = time_distribution(&hourly, &daily);

        let (first_half, second_half) = window.halves();
        let trend_analysis = trend_analysis(
            &store
                .daily_game_counts(player_id, first_half)
                .map_err(|e| Error::stage("trend analysis", e))?,
            &store
                .daily_game_counts(player_id, second_half)
                .map_err(|e| Error::stage("trend analysis", e))?,
        );

        let stakes = store
            .round_stakes(player_id, window)
            .map_err(|e| Error::stage("betting habits", e))?;
        let betting_habits = betting_habits(&stakes);

        let preference_metrics = preference_metrics(&game_type_stats, &favorite_game_type);

        let mut analysis = GamePreferenceAnalysis {
            player_id,
            username: player.username,
            analysis_date: now,
            time_range: request.time_range,
            total_games_played,
            unique_game_types: game_type_stats.len(),
            favorite_game_type,
            game_type_stats,
            time_distribution,
            trend_analysis,
            betting_habits,
            preference_metrics,
            recommendations: Vec::new(),
            graph_data: None,
        };
        analysis.recommendations = recommendations(&analysis);
        if include_graphs {
            analysis.graph_data = Some(graph_data(&analysis.game_type_stats));
        }

        tracing::info!(
            player_id,
            time_range = %request.time_range,
            total_games = analysis.total_games_played,
            favorite = %analysis.favorite_game_type,
            duration_ms = started.elapsed().as_millis() as u64,
            "Game preference analysis complete"
        );

        if self.config.persist_results {
            self.persist(&analysis);
        }

        Ok(analysis)
    }

    fn persist(&self, analysis: &GamePreferenceAnalysis) {
        let record = match AnalysisRecord::from_analysis(
            AnalysisKind::GamePreference,
            analysis.player_id,
            analysis.time_range.as_str(),
            analysis,
            analysis.analysis_date,
        ) {
            Ok(record) => record.with_label(analysis.favorite_game_type.clone()),
            Err(e) => {
                tracing::warn!(error = %e, player_id = analysis.player_id, "Failed to serialize analysis");
                return;
            }
        };
        persist_best_effort(self.store.as_ref(), &record);
    }
}

// ============================================
// Composition (pure)
// ============================================

fn game_type_statistics(aggregates: &[GameTypeAggregate]) -> Vec<GameTypeStatistics> {
    let total: i64 = aggregates.iter().map(|a| a.games_played).sum();

    aggregates
        .iter()
        .map(|a| {
            let participation_rate = percentage(a.games_played as f64, total as f64);
            let win_rate = percentage(a.winning_rounds as f64, a.rounds as f64);
            GameTypeStatistics {
                game_type: a.game_type.clone(),
                games_played: a.games_played,
                participation_rate,
                total_time_spent: a.total_minutes,
                average_session: a.average_minutes,
                total_bet_amount: a.total_bet,
                total_win_amount: a.total_win,
                net_result: a.total_win - a.total_bet,
                win_rate,
                preference_score: scoring::game_preference_score(
                    participation_rate,
                    a.average_minutes,
                    win_rate,
                    a.total_bet,
                    a.total_win,
                ),
            }
        })
        .collect()
}

/// Highest preference score; the earlier (more played) type wins ties.
fn favorite_game_type(stats: &[GameTypeStatistics]) -> String {
    let mut best: Option<&GameTypeStatistics> = None;
    for stat in stats {
        if best.map_or(true, |b| stat.preference_score > b.preference_score) {
            best = Some(stat);
        }
    }
    best.map(|s| s.game_type.clone()).unwrap_or_default()
}

/// Entry with the most plays; ties keep the first seen.
fn most_played(breakdown: &BTreeMap<String, i64>) -> String {
    let mut best: Option<(&String, i64)> = None;
    for (game, &count) in breakdown {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((game, count));
        }
    }
    best.map(|(g, _)| g.clone()).unwrap_or_default()
}

fn time_distribution(hourly: &[HourlyGameCount], daily: &[DailyGameCount]) -> TimeDistribution {
    let hourly_preference = hourly_preference(hourly);
    let daily_preference = daily_preference(daily);

    let mut peak_hour = 0;
    let mut peak_games = 0;
    for pref in &hourly_preference {
        if pref.games_played > peak_games {
            peak_games = pref.games_played;
            peak_hour = pref.hour;
        }
    }

    let active: Vec<&DailyPreference> = daily_preference
        .iter()
        .filter(|d| d.games_played > 0)
        .collect();
    let average_daily_minutes = if active.is_empty() {
        None
    } else {
        Some(active.iter().map(|d| d.total_play_time).sum::<f64>() / active.len() as f64)
    };

    TimeDistribution {
        hourly_preference,
        weekly_pattern: weekly_pattern(daily),
        seasonal_pattern: seasonal_pattern(daily),
        daily_preference,
        peak_playing_time: scoring::time_of_day(peak_hour).to_string(),
        preferred_duration: scoring::preferred_duration(average_daily_minutes).to_string(),
    }
}

fn hourly_preference(counts: &[HourlyGameCount]) -> Vec<HourlyPreference> {
    let mut breakdowns: Vec<BTreeMap<String, i64>> = vec![BTreeMap::new(); 24];
    for count in counts {
        if let Some(slot) = breakdowns.get_mut(count.hour as usize) {
            *slot.entry(count.game_type.clone()).or_default() += count.games;
        }
    }

    breakdowns
        .into_iter()
        .enumerate()
        .map(|(hour, game_type_breakdown)| {
            let games_played = game_type_breakdown.values().sum();
            HourlyPreference {
                hour: hour as u32,
                games_played,
                most_played_game: most_played(&game_type_breakdown),
                activity_level: scoring::hourly_activity_level(games_played).to_string(),
                game_type_breakdown,
            }
        })
        .collect()
}

fn daily_preference(counts: &[DailyGameCount]) -> Vec<DailyPreference> {
    let mut days: BTreeMap<String, (BTreeMap<String, i64>, f64)> = BTreeMap::new();
    for count in counts {
        let (breakdown, minutes) = days.entry(count.date.clone()).or_default();
        *breakdown.entry(count.game_type.clone()).or_default() += count.games;
        *minutes += count.minutes;
    }

    days.into_iter()
        .map(|(date, (game_type_breakdown, total_play_time))| DailyPreference {
            date,
            games_played: game_type_breakdown.values().sum(),
            most_played_game: most_played(&game_type_breakdown),
            game_type_breakdown,
            total_play_time,
        })
        .collect()
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn weekly_pattern(counts: &[DailyGameCount]) -> WeeklyPattern {
    let mut games = [0i64; 7];
    let mut minutes = [0f64; 7];
    let mut breakdowns: Vec<BTreeMap<String, i64>> = vec![BTreeMap::new(); 7];

    for count in counts {
        let Some(date) = parse_date(&count.date) else {
            continue;
        };
        let idx = date.weekday().num_days_from_monday() as usize;
        games[idx] += count.games;
        minutes[idx] += count.minutes;
        *breakdowns[idx].entry(count.game_type.clone()).or_default() += count.games;
    }

    let total: i64 = games.iter().sum();
    let per_day_average = total as f64 / 7.0;

    let weekday_pattern = WEEKDAYS
        .iter()
        .zip(breakdowns)
        .enumerate()
        .map(|(i, (&day, game_type_breakdown))| {
            let intensity = if games[i] == 0 {
                "low"
            } else if games[i] as f64 > per_day_average * 1.5 {
                "high"
            } else if games[i] as f64 >= per_day_average * 0.5 {
                "medium"
            } else {
                "low"
            };
            WeekdayStats {
                weekday: weekday_name(day).to_string(),
                games_played: games[i],
                average_session: if games[i] > 0 {
                    minutes[i] / games[i] as f64
                } else {
                    0.0
                },
                game_type_breakdown,
                intensity: intensity.to_string(),
            }
        })
        .collect();

    let weekend = games[5] + games[6];
    let active_days: Vec<f64> = games
        .iter()
        .filter(|&&g| g > 0)
        .map(|&g| g as f64)
        .collect();
    let consistency_score = if active_days.is_empty() {
        0.0
    } else {
        clamp_score(100.0 * (1.0 - scoring::coefficient_of_variation(&active_days)))
    };

    WeeklyPattern {
        weekday_pattern,
        weekend_intensity: percentage(weekend as f64, total as f64),
        consistency_score,
    }
}

fn seasonal_pattern(counts: &[DailyGameCount]) -> Vec<SeasonalPattern> {
    let mut games = [0i64; 4];
    let mut breakdowns: Vec<BTreeMap<String, i64>> = vec![BTreeMap::new(); 4];

    for count in counts {
        let Some(date) = parse_date(&count.date) else {
            continue;
        };
        let quarter = (date.month0() / 3) as usize;
        games[quarter] += count.games;
        *breakdowns[quarter]
            .entry(count.game_type.clone())
            .or_default() += count.games;
    }

    let total: i64 = games.iter().sum();
    breakdowns
        .into_iter()
        .enumerate()
        .map(|(q, game_type_breakdown)| SeasonalPattern {
            period: format!("Q{}", q + 1),
            games_played: games[q],
            game_type_breakdown,
            activity_index: percentage(games[q] as f64, total as f64) * 4.0,
        })
        .collect()
}

fn plays_by_type(counts: &[DailyGameCount]) -> BTreeMap<String, i64> {
    let mut plays = BTreeMap::new();
    for count in counts {
        *plays.entry(count.game_type.clone()).or_default() += count.games;
    }
    plays
}

fn trend_analysis(first: &[DailyGameCount], second: &[DailyGameCount]) -> Vec<GameTypeTrend> {
    let before = plays_by_type(first);
    let after = plays_by_type(second);

    let mut types: Vec<&String> = before.keys().chain(after.keys()).collect();
    types.sort();
    types.dedup();

    types
        .into_iter()
        .map(|game_type| {
            let b = before.get(game_type).copied().unwrap_or(0);
            let a = after.get(game_type).copied().unwrap_or(0);
            let change_rate = if b > 0 {
                (a - b) as f64 / b as f64 * 100.0
            } else if a > 0 {
                100.0
            } else {
                0.0
            };

            let trend_direction = if change_rate > 10.0 {
                "increasing"
            } else if change_rate < -10.0 {
                "decreasing"
            } else {
                "stable"
            };
            let significance = if change_rate.abs() >= 50.0 {
                "high"
            } else if change_rate.abs() >= 20.0 {
                "medium"
            } else {
                "low"
            };
            let description = match trend_direction {
                "stable" => format!("{} play is steady ({} -> {} sessions)", game_type, b, a),
                direction => format!(
                    "{} play is {} by {:.1}% ({} -> {} sessions)",
                    game_type,
                    direction,
                    change_rate.abs(),
                    b,
                    a
                ),
            };

            GameTypeTrend {
                game_type: game_type.clone(),
                trend_direction: trend_direction.to_string(),
                change_rate,
                significance: significance.to_string(),
                description,
            }
        })
        .collect()
}

/// Label a bet sequence: flat when bets barely move, progressive when most
/// consecutive changes are raises.
fn betting_strategy(bets: &[f64]) -> &'static str {
    if bets.len() < 2 || scoring::coefficient_of_variation(bets) < 0.1 {
        return "flat_betting";
    }
    let changes: Vec<f64> = bets
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d != 0.0)
        .collect();
    let raises = changes.iter().filter(|d| **d > 0.0).count();
    if !changes.is_empty() && raises as f64 / changes.len() as f64 >= 0.6 {
        "progressive"
    } else {
        "varied"
    }
}

fn betting_habits(stakes: &[RoundStake]) -> Vec<BettingHabit> {
    let mut by_type: BTreeMap<&str, (Vec<f64>, f64)> = BTreeMap::new();
    for stake in stakes {
        let (bets, wins) = by_type.entry(stake.game_type.as_str()).or_default();
        bets.push(stake.bet_amount);
        *wins += stake.win_amount;
    }

    by_type
        .into_iter()
        .map(|(game_type, (bets, total_win))| {
            let cv = scoring::coefficient_of_variation(&bets);
            let risk_tolerance = if cv < 0.5 {
                "conservative"
            } else if cv < 1.0 {
                "moderate"
            } else {
                "aggressive"
            };

            let total_bet: f64 = bets.iter().sum();
            let net = total_win - total_bet;
            let profitability_rating = if net > total_bet * 0.05 {
                "profitable"
            } else if net < -total_bet * 0.05 {
                "losing"
            } else {
                "break_even"
            };

            BettingHabit {
                game_type: game_type.to_string(),
                average_bet_amount: scoring::mean(&bets),
                median_bet_amount: scoring::median(&bets),
                bet_size_variability: scoring::std_dev(&bets),
                risk_tolerance: risk_tolerance.to_string(),
                betting_strategy: betting_strategy(&bets).to_string(),
                profitability_rating: profitability_rating.to_string(),
            }
        })
        .collect()
}

fn preference_metrics(stats: &[GameTypeStatistics], favorite: &str) -> PreferenceMetrics {
    let counts: Vec<i64> = stats.iter().map(|s| s.games_played).collect();
    let diversity_index = scoring::diversity_index(&counts);

    let loyalty_score = stats
        .iter()
        .find(|s| s.game_type == favorite)
        .map(|s| clamp_score(s.participation_rate))
        .unwrap_or(0.0);

    let total_bet: f64 = stats.iter().map(|s| s.total_bet_amount).sum();
    let total_win: f64 = stats.iter().map(|s| s.total_win_amount).sum();
    let total_games: i64 = counts.iter().sum();
    let total_minutes: f64 = stats.iter().map(|s| s.total_time_spent).sum();
    let average_session = if total_games > 0 {
        total_minutes / total_games as f64
    } else {
        0.0
    };

    PreferenceMetrics {
        diversity_index,
        specialization_level: scoring::specialization_level(diversity_index).to_string(),
        exploration_tendency: scoring::exploration_tendency(stats.len()).to_string(),
        loyalty_score,
        risk_profile: scoring::risk_profile(total_bet, total_win).to_string(),
        play_style: scoring::play_style(average_session).to_string(),
    }
}

fn recommendations(analysis: &GamePreferenceAnalysis) -> Vec<String> {
    let mut recs = Vec::new();

    if analysis.unique_game_types <= 2 {
        recs.push("Try more game types to broaden the playing experience".to_string());
    }
    if !analysis.favorite_game_type.is_empty() {
        recs.push(format!(
            "Favorite game is {}; consider promotions built around it",
            analysis.favorite_game_type
        ));
    }
    if analysis.preference_metrics.risk_profile == "aggressive" {
        recs.push("Losses outpace wins; suggest a betting budget or limit".to_string());
    }

    recs
}

fn graph_data(stats: &[GameTypeStatistics]) -> Vec<GraphData> {
    if stats.is_empty() {
        return Vec::new();
    }

    vec![GraphData {
        graph_type: "pie".to_string(),
        title: "Game type distribution".to_string(),
        x_axis_label: String::new(),
        y_axis_label: String::new(),
        data_points: stats
            .iter()
            .enumerate()
            .map(|(i, s)| GraphDataPoint {
                label: s.game_type.clone(),
                value: s.participation_rate,
                color: Some(CHART_COLORS[i % CHART_COLORS.len()].to_string()),
            })
            .collect(),
    }]
}
