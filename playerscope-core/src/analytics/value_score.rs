//! Player value scoring
//!
//! Five sub-scores (activity, loyalty, spending, risk, profitability) are
//! combined into a weighted overall score and a value tier. With details
//! enabled the analysis also carries a trend against the preceding window,
//! a percentile among active players, retention risk and growth potential.

use super::persistence::{persist_best_effort, AnalysisKind, AnalysisRecord};
use super::scoring::{
    self, ActivityInputs, ActivityScore, LoyaltyInputs, LoyaltyScore, ProfitabilityInputs,
    ProfitabilityScore, RiskInputs, RiskScore, SpendingInputs, SpendingScore,
};
use super::store::{PlayerStore, ScoreRank};
use super::window::{AnalysisWindow, TimeRange};
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::types::{Player, PlayerId, ScoreWeights};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

// ============================================
// Request / response
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueScoreRequest {
    pub time_range: TimeRange,
    #[serde(default)]
    pub include_details: Option<bool>,
    /// Falls back to the configured default weights
    #[serde(default)]
    pub weight_config: Option<ScoreWeights>,
}

impl Default for ValueScoreRequest {
    fn default() -> Self {
        Self {
            time_range: TimeRange::Days90,
            include_details: Some(true),
            weight_config: None,
        }
    }
}

impl ValueScoreRequest {
    /// Parse a request body, substituting the default request (90d, details,
    /// default weights) when the body is missing, malformed, or names a range
    /// the value score does not accept.
    pub fn from_json_lenient(body: &[u8]) -> Self {
        match serde_json::from_slice::<ValueScoreRequest>(body) {
            Ok(request) if request.time_range.is_value_range() => request,
            Ok(request) => {
                tracing::debug!(time_range = %request.time_range, "Unsupported range, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable value score request, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueScoreAnalysis {
    pub player_id: PlayerId,
    pub username: String,
    pub analysis_date: DateTime<Utc>,
    pub time_range: TimeRange,
    pub overall_score: f64,
    /// VIP, High, Medium, Low
    pub value_category: String,
    pub weights: ScoreWeights,
    pub activity_score: ActivityScore,
    pub loyalty_score: LoyaltyScore,
    pub spending_score: SpendingScore,
    pub risk_score: RiskScore,
    pub profitability_score: ProfitabilityScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_analysis: Option<ValueTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<CompetitorAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_risk: Option<RetentionRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_potential: Option<ValuePotential>,
    pub recommendations: Vec<String>,
}

/// Activity in this window against the preceding window of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTrend {
    pub current_vs_previous: f64,
    pub trend_direction: String,
    pub volatility_level: String,
    pub score_history: Vec<ScoreHistoryPoint>,
    /// Linear extrapolation of the last two points
    pub predicted_score: f64,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistoryPoint {
    /// Window start, `YYYY-MM-DD`
    pub date: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub percentile: f64,
    pub above_average_areas: Vec<String>,
    pub below_average_areas: Vec<String>,
    pub similar_players: i64,
    pub competitive_advantage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRisk {
    pub risk_level: String,
    pub churn_probability: f64,
    pub days_to_churn: u32,
    pub retention_actions: Vec<String>,
    pub critical_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePotential {
    pub growth_potential: String,
    pub upsell_opportunities: Vec<String>,
    pub optimization_areas: Vec<String>,
    pub max_potential_score: f64,
    /// Days
    pub time_to_max_potential: u32,
}

// ============================================
// Analyzer
// ============================================

/// Builds a [`ValueScoreAnalysis`] from a [`PlayerStore`].
#[derive(Clone)]
pub struct ValueScoreAnalyzer {
    store: Arc<dyn PlayerStore>,
    config: AnalyticsConfig,
}

impl ValueScoreAnalyzer {
    pub fn new(store: Arc<dyn PlayerStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn analyze(
        &self,
        player_id: PlayerId,
        request: &ValueScoreRequest,
    ) -> Result<ValueScoreAnalysis> {
        self.analyze_at(player_id, request, Utc::now())
    }

    /// Run the analysis with the window ending at `now`.
    pub fn analyze_at(
        &self,
        player_id: PlayerId,
        request: &ValueScoreRequest,
        now: DateTime<Utc>,
    ) -> Result<ValueScoreAnalysis> {
        let started = Instant::now();

        if !request.time_range.is_value_range() {
            return Err(Error::InvalidRequest(format!(
                "time_range {} is not supported for value scoring",
                request.time_range
            )));
        }
        let weights = request
            .weight_config
            .unwrap_or(self.config.default_weights);
        if !weights.is_valid() {
            return Err(Error::InvalidRequest(
                "weight_config weights must be finite and non-negative".to_string(),
            ));
        }

        let store = self.store.as_ref();
        let player = store
            .find_player(player_id)?
            .ok_or(Error::PlayerNotFound(player_id))?;

        let window = request.time_range.calendar_window_ending(now);
        let include_details = request.include_details.unwrap_or(true);

        tracing::debug!(
            player_id,
            time_range = %request.time_range,
            include_details,
            "Scoring player value"
        );

        let activity_score = activity_for(store, &player, window, now)
            .map_err(|e| Error::stage("activity score", e))?;
        let loyalty_score = self
            .loyalty(&player, window, now)
            .map_err(|e| Error::stage("loyalty score", e))?;
        let spending_score = self
            .spending(player_id, window)
            .map_err(|e| Error::stage("spending score", e))?;
        let risk_score = self
            .risk(&player, window)
            .map_err(|e| Error::stage("risk score", e))?;
        let profitability_score = self
            .profitability(&player, window, now)
            .map_err(|e| Error::stage("profitability score", e))?;

        let overall_score = scoring::overall_value_score(
            activity_score.score,
            loyalty_score.score,
            spending_score.score,
            risk_score.score,
            profitability_score.score,
            &weights,
        );

        let mut analysis = ValueScoreAnalysis {
            player_id,
            username: player.username.clone(),
            analysis_date: now,
            time_range: request.time_range,
            overall_score,
            value_category: scoring::value_category(overall_score).to_string(),
            weights,
            activity_score,
            loyalty_score,
            spending_score,
            risk_score,
            profitability_score,
            trend_analysis: None,
            competitor_analysis: None,
            retention_risk: None,
            value_potential: None,
            recommendations: Vec::new(),
        };

        if include_details {
            let previous = activity_for(store, &player, window.previous(), now)
                .map_err(|e| Error::stage("trend analysis", e))?;
            analysis.trend_analysis = Some(value_trend(
                &previous,
                &analysis.activity_score,
                window,
            ));

            let rank = match store.value_score_rank(overall_score) {
                Ok(rank) => Some(rank),
                Err(e) => {
                    tracing::warn!(error = %e, player_id, "Percentile query failed, using fixed buckets");
                    None
                }
            };
            analysis.competitor_analysis = Some(competitor_analysis(&analysis, rank));
            analysis.retention_risk = Some(retention_risk(&analysis));
            analysis.value_potential = Some(value_potential(&analysis));
        }
        analysis.recommendations = recommendations(&analysis);

        tracing::info!(
            player_id,
            time_range = %request.time_range,
            overall_score = analysis.overall_score,
            value_category = %analysis.value_category,
            duration_ms = started.elapsed().as_millis() as u64,
            "Value score analysis complete"
        );

        if self.config.persist_results {
            self.persist(&analysis);
        }

        Ok(analysis)
    }

    fn persist(&self, analysis: &ValueScoreAnalysis) {
        let record = match AnalysisRecord::from_analysis(
            AnalysisKind::ValueScore,
            analysis.player_id,
            analysis.time_range.as_str(),
            analysis,
            analysis.analysis_date,
        ) {
            Ok(record) => record
                .with_label(analysis.value_category.clone())
                .with_score(analysis.overall_score),
            Err(e) => {
                tracing::warn!(error = %e, player_id = analysis.player_id, "Failed to serialize analysis");
                return;
            }
        };
        persist_best_effort(self.store.as_ref(), &record);
    }

    fn loyalty(
        &self,
        player: &Player,
        window: AnalysisWindow,
        now: DateTime<Utc>,
    ) -> Result<LoyaltyScore> {
        let games = self.store.game_activity(player.id, window)?;
        Ok(scoring::loyalty_score(&LoyaltyInputs {
            tenure_days: tenure_days(player, now),
            unique_game_types: games.unique_game_types,
            total_games: games.total_games,
            window_days: window.days(),
        }))
    }

    fn spending(&self, player_id: PlayerId, window: AnalysisWindow) -> Result<SpendingScore> {
        let store = self.store.as_ref();
        let ledger = store.ledger_totals(player_id, window)?;
        let (first, second) = window.halves();

        Ok(scoring::spending_score(&SpendingInputs {
            deposit_total: ledger.deposit_total,
            deposit_count: ledger.deposit_count,
            window_days: window.days(),
            deposit_amounts: store.deposit_amounts(player_id, window)?,
            first_half_total: store.ledger_totals(player_id, first)?.deposit_total,
            second_half_total: store.ledger_totals(player_id, second)?.deposit_total,
            completed_deposits: ledger.completed_deposits,
        }))
    }

    fn risk(&self, player: &Player, window: AnalysisWindow) -> Result<RiskScore> {
        let store = self.store.as_ref();
        let logins = store.login_stats(player.id, window)?;
        let bets = store.bet_stats(player.id, window)?;
        let ledger = store.ledger_totals(player.id, window)?;

        Ok(scoring::risk_score(&RiskInputs {
            unique_login_hours: logins.unique_hours,
            average_bet: bets.average_bet,
            max_bet: bets.max_bet,
            large_deposits: ledger.large_deposits,
            deposit_total: ledger.deposit_total,
            withdrawal_total: ledger.withdrawal_total,
            verification_level: player.verification_level,
            unique_ips: logins.unique_ips,
        }))
    }

    fn profitability(
        &self,
        player: &Player,
        window: AnalysisWindow,
        now: DateTime<Utc>,
    ) -> Result<ProfitabilityScore> {
        let store = self.store.as_ref();
        let bets = store.bet_stats(player.id, window)?;
        let ledger = store.ledger_totals(player.id, window)?;
        let (first, second) = window.halves();

        Ok(scoring::profitability_score(&ProfitabilityInputs {
            gaming_revenue: bets.house_net(),
            fee_total: ledger.fee_total,
            deposit_total: ledger.deposit_total,
            tenure_days: tenure_days(player, now),
            first_half_gaming_revenue: store.bet_stats(player.id, first)?.house_net(),
            second_half_gaming_revenue: store.bet_stats(player.id, second)?.house_net(),
            acquisition_cost: self.config.customer_acquisition_cost,
        }))
    }
}

fn tenure_days(player: &Player, now: DateTime<Utc>) -> i64 {
    (now - player.created_at).num_days().max(0)
}

fn activity_for(
    store: &dyn PlayerStore,
    player: &Player,
    window: AnalysisWindow,
    now: DateTime<Utc>,
) -> Result<ActivityScore> {
    let logins = store.login_stats(player.id, window)?;
    let games = store.game_activity(player.id, window)?;

    Ok(scoring::activity_score(&ActivityInputs {
        login_days: logins.login_days,
        window_days: window.days(),
        total_games: games.total_games,
        average_session_minutes: games.average_session_minutes,
        last_activity_days: player
            .last_login_at
            .map(|at| (now - at).num_days().max(0)),
    }))
}

// ============================================
// Detail sections (pure)
// ============================================

fn value_trend(
    previous: &ActivityScore,
    current: &ActivityScore,
    window: AnalysisWindow,
) -> ValueTrend {
    let diff = current.score - previous.score;

    let trend_direction = if diff > 5.0 {
        "increasing"
    } else if diff < -5.0 {
        "decreasing"
    } else {
        "stable"
    };
    let volatility_level = if diff.abs() > 20.0 {
        "high"
    } else if diff.abs() > 10.0 {
        "medium"
    } else {
        "low"
    };
    let confidence_level = match volatility_level {
        "low" => 0.8,
        "medium" => 0.6,
        _ => 0.4,
    };

    let previous_window = window.previous();
    ValueTrend {
        current_vs_previous: diff,
        trend_direction: trend_direction.to_string(),
        volatility_level: volatility_level.to_string(),
        score_history: vec![
            ScoreHistoryPoint {
                date: previous_window.start.format("%Y-%m-%d").to_string(),
                score: previous.score,
            },
            ScoreHistoryPoint {
                date: window.start.format("%Y-%m-%d").to_string(),
                score: current.score,
            },
        ],
        predicted_score: scoring::clamp_score(current.score + diff),
        confidence_level,
    }
}

/// Percentile used when the history query is unavailable.
fn fallback_percentile(overall_score: f64) -> f64 {
    if overall_score >= 80.0 {
        95.0
    } else if overall_score >= 60.0 {
        75.0
    } else if overall_score >= 40.0 {
        50.0
    } else {
        25.0
    }
}

fn competitor_analysis(analysis: &ValueScoreAnalysis, rank: Option<ScoreRank>) -> CompetitorAnalysis {
    let (percentile, active_players) = match rank {
        Some(rank) if rank.active_players > 0 => (
            scoring::percentage(rank.lower_count as f64, rank.active_players as f64),
            rank.active_players,
        ),
        Some(_) => (0.0, 0),
        None => (fallback_percentile(analysis.overall_score), 0),
    };

    let areas = [
        ("activity", analysis.activity_score.score),
        ("loyalty", analysis.loyalty_score.score),
        ("spending", analysis.spending_score.score),
        ("risk control", 100.0 - analysis.risk_score.score),
        ("profitability", analysis.profitability_score.score),
    ];
    let above_average_areas = areas
        .iter()
        .filter(|(_, score)| *score > 50.0)
        .map(|(name, _)| name.to_string())
        .collect();
    let below_average_areas = areas
        .iter()
        .filter(|(_, score)| *score < 50.0)
        .map(|(name, _)| name.to_string())
        .collect();

    let competitive_advantage = if percentile > 75.0 {
        "High-value player with a clear competitive edge"
    } else if percentile > 50.0 {
        "Mid-value player with room to grow"
    } else {
        "Needs focused attention and development"
    };

    CompetitorAnalysis {
        percentile,
        above_average_areas,
        below_average_areas,
        // a tenth of the active base is treated as the peer group
        similar_players: (active_players as f64 * 0.1) as i64,
        competitive_advantage: competitive_advantage.to_string(),
    }
}

fn retention_risk(analysis: &ValueScoreAnalysis) -> RetentionRisk {
    let activity = analysis.activity_score.score;
    let loyalty = &analysis.loyalty_score;
    let spending = analysis.spending_score.score;

    let mut churn = 0.0;
    if activity < 30.0 {
        churn += 0.3;
    } else if activity < 60.0 {
        churn += 0.15;
    }
    churn += loyalty.churn_probability * 0.4;
    if spending < 20.0 {
        churn += 0.2;
    }
    if analysis.risk_score.score > 60.0 {
        churn += 0.1;
    }
    let churn_probability = f64::min(churn, 1.0);

    let (risk_level, days_to_churn, actions) = if churn_probability > 0.7 {
        (
            "high",
            30,
            vec![
                "Reach out with immediate customer care",
                "Offer personalized incentives",
                "Assign an account manager",
            ],
        )
    } else if churn_probability > 0.4 {
        (
            "medium",
            90,
            vec![
                "Increase engagement touchpoints",
                "Recommend suitable events",
                "Watch for behavior changes",
            ],
        )
    } else {
        (
            "low",
            180,
            vec!["Maintain current service level", "Check in periodically"],
        )
    };

    let mut critical_factors = Vec::new();
    if activity < 40.0 {
        critical_factors.push("Declining activity".to_string());
    }
    if loyalty.churn_probability > 0.5 {
        critical_factors.push("Weak loyalty".to_string());
    }
    if spending < 30.0 {
        critical_factors.push("Low spending".to_string());
    }

    RetentionRisk {
        risk_level: risk_level.to_string(),
        churn_probability,
        days_to_churn,
        retention_actions: actions.iter().map(|a| a.to_string()).collect(),
        critical_factors,
    }
}

fn value_potential(analysis: &ValueScoreAnalysis) -> ValuePotential {
    let growth_factors = [
        analysis.activity_score.engagement_trend == "increasing",
        analysis.loyalty_score.loyalty_trend == "stable",
        analysis.spending_score.spending_growth > 60.0,
        analysis.profitability_score.profitability_trend == "increasing",
    ]
    .iter()
    .filter(|&&f| f)
    .count();

    let (growth_potential, time_to_max_potential) = match growth_factors {
        n if n >= 3 => ("high", 60),
        2 => ("medium", 120),
        _ => ("low", 180),
    };

    let mut upsell_opportunities = Vec::new();
    if analysis.spending_score.spending_category == "low_spender"
        && analysis.activity_score.score > 60.0
    {
        upsell_opportunities.push("Raise spending tier".to_string());
    }
    if analysis.loyalty_score.score > 70.0 {
        upsell_opportunities.push("Promote VIP services".to_string());
    }

    let mut optimization_areas = Vec::new();
    if analysis.activity_score.score < 60.0 {
        optimization_areas.push("Increase player activity".to_string());
    }
    if analysis.spending_score.score < 50.0 {
        optimization_areas.push("Encourage spending".to_string());
    }
    if analysis.risk_score.score > 40.0 {
        optimization_areas.push("Reduce risk level".to_string());
    }

    ValuePotential {
        growth_potential: growth_potential.to_string(),
        upsell_opportunities,
        optimization_areas,
        max_potential_score: f64::min(analysis.overall_score + 30.0, 100.0),
        time_to_max_potential,
    }
}

fn recommendations(analysis: &ValueScoreAnalysis) -> Vec<String> {
    let mut recs = Vec::new();

    let tier = if analysis.overall_score >= 80.0 {
        "Maintain VIP service level and offer exclusive benefits"
    } else if analysis.overall_score >= 60.0 {
        "Improve service quality to move the player toward VIP"
    } else {
        "Develop the player with personalized service"
    };
    recs.push(tier.to_string());

    if analysis.activity_score.score < 50.0 {
        recs.push("Design engaging events to lift participation".to_string());
    }
    if analysis.loyalty_score.churn_probability > 0.5 {
        recs.push("Strengthen relationship management to reduce churn risk".to_string());
    }
    if analysis.spending_score.score < 40.0 {
        recs.push("Run spending promotions to raise purchase intent".to_string());
    }
    if analysis.risk_score.score > 60.0 {
        recs.push("Tighten risk monitoring to stay compliant".to_string());
    }
    if analysis.profitability_score.score < 30.0 {
        recs.push("Rework the product mix to raise player contribution".to_string());
    }

    recs
}
