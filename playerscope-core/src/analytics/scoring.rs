//! Scoring functions
//!
//! Pure, deterministic mappings from aggregates to bounded scores. No I/O.
//! Every score is clamped to `[0, 100]` after weighting; intermediate
//! sub-metrics are capped where noted.
//!
//! The thresholds and weights below are product-defined business rules.

use crate::types::{ScoreWeights, VerificationLevel};
use serde::{Deserialize, Serialize};

/// Clamp to `[0, 100]`, mapping NaN to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

// ============================================
// Game preference
// ============================================

/// Fit of an average session length to the 30..=60 minute sweet spot (0..=30).
///
/// Decays by 0.5 per minute outside the band; no sessions scores 0.
pub fn session_duration_fit(average_minutes: f64) -> f64 {
    if (30.0..=60.0).contains(&average_minutes) {
        30.0
    } else if average_minutes > 0.0 {
        let distance = (average_minutes - 30.0)
            .abs()
            .min((average_minutes - 60.0).abs());
        (30.0 - distance * 0.5).max(0.0)
    } else {
        0.0
    }
}

/// Profit component of a preference score (0..=10).
///
/// 10 for a net win; otherwise `10 × (1 − loss_rate)` where the loss rate is
/// the net loss as a share of the amount bet. No bets scores 0.
pub fn profit_component(total_bet: f64, total_win: f64) -> f64 {
    let net = total_win - total_bet;
    if net > 0.0 {
        10.0
    } else if total_bet > 0.0 {
        let loss_rate = -net / total_bet;
        (10.0 - loss_rate * 10.0).max(0.0)
    } else {
        0.0
    }
}

/// Preference score for one game type (0..=100).
pub fn game_preference_score(
    participation_rate: f64,
    average_minutes: f64,
    win_rate: f64,
    total_bet: f64,
    total_win: f64,
) -> f64 {
    let score = participation_rate * 0.4
        + session_duration_fit(average_minutes)
        + (win_rate * 0.4).min(20.0)
        + profit_component(total_bet, total_win);
    clamp_score(score)
}

/// Normalized Shannon entropy of a play-count distribution.
///
/// 0 when one type (or none) has plays; 1 for a uniform spread.
pub fn diversity_index(counts: &[i64]) -> f64 {
    let played: Vec<f64> = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| c as f64)
        .collect();
    if played.len() <= 1 {
        return 0.0;
    }
    let total: f64 = played.iter().sum();
    let entropy: f64 = played
        .iter()
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum();
    (entropy / (played.len() as f64).log2()).clamp(0.0, 1.0)
}

pub fn specialization_level(diversity: f64) -> &'static str {
    if diversity < 0.3 {
        "focused"
    } else if diversity < 0.7 {
        "specialist"
    } else {
        "generalist"
    }
}

pub fn exploration_tendency(unique_game_types: usize) -> &'static str {
    if unique_game_types >= 4 {
        "explorer"
    } else if unique_game_types >= 2 {
        "balanced"
    } else {
        "settler"
    }
}

/// Qualitative label for sessions started in one hour.
pub fn hourly_activity_level(games: i64) -> &'static str {
    match games {
        0 => "inactive",
        1..=5 => "low",
        6..=15 => "medium",
        16..=30 => "high",
        _ => "peak",
    }
}

/// Part of day an hour falls in.
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        6..=11 => "morning",
        12..=17 => "afternoon",
        18..=23 => "evening",
        _ => "night",
    }
}

/// Preferred play length from average minutes per active day.
pub fn preferred_duration(average_daily_minutes: Option<f64>) -> &'static str {
    match average_daily_minutes {
        Some(m) if m < 30.0 => "short",
        Some(m) if m < 120.0 => "medium",
        Some(_) => "long",
        None => "medium",
    }
}

/// Play style from average session length.
pub fn play_style(average_session_minutes: f64) -> &'static str {
    if average_session_minutes < 30.0 {
        "casual"
    } else if average_session_minutes < 90.0 {
        "regular"
    } else {
        "hardcore"
    }
}

/// Risk appetite from the aggregate return on stakes.
pub fn risk_profile(total_bet: f64, total_win: f64) -> &'static str {
    if total_bet <= 0.0 {
        return "balanced";
    }
    let return_ratio = total_win / total_bet;
    if return_ratio < 0.8 {
        "aggressive"
    } else if return_ratio > 1.05 {
        "conservative"
    } else {
        "balanced"
    }
}

// ============================================
// Dispersion helpers
// ============================================

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Coefficient of variation, 0 when the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m > 0.0 {
        std_dev(values) / m
    } else {
        0.0
    }
}

// ============================================
// Activity
// ============================================

/// Raw activity inputs for one window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityInputs {
    pub login_days: i64,
    pub window_days: i64,
    pub total_games: i64,
    pub average_session_minutes: f64,
    /// Days since last login; `None` when the player never logged in
    pub last_activity_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub score: f64,
    pub login_frequency: f64,
    pub game_participation: f64,
    pub session_duration: f64,
    pub last_activity_days: i64,
    pub consistency_level: String,
    pub engagement_trend: String,
}

/// Days reported when a player has no recorded login.
pub const NO_ACTIVITY_DAYS: i64 = 999;

pub fn activity_score(input: &ActivityInputs) -> ActivityScore {
    let login_frequency = if input.window_days > 0 {
        clamp_score(input.login_days as f64 / input.window_days as f64 * 100.0)
    } else {
        0.0
    };
    // 30 games per window saturates participation
    let game_participation = clamp_score(input.total_games as f64 / 30.0 * 100.0);
    // 60 minutes per session saturates duration
    let session_duration = clamp_score(input.average_session_minutes / 60.0 * 100.0);

    let last_activity_days = input.last_activity_days.unwrap_or(NO_ACTIVITY_DAYS);

    let days = input.window_days as f64;
    let consistency_level = if input.login_days as f64 >= (days * 0.8).floor() {
        "high"
    } else if input.login_days as f64 >= (days * 0.5).floor() {
        "medium"
    } else {
        "low"
    };

    let engagement_trend = if last_activity_days <= 3 {
        "increasing"
    } else if last_activity_days <= 7 {
        "stable"
    } else {
        "decreasing"
    };

    ActivityScore {
        score: clamp_score(
            login_frequency * 0.4 + game_participation * 0.4 + session_duration * 0.2,
        ),
        login_frequency,
        game_participation,
        session_duration,
        last_activity_days,
        consistency_level: consistency_level.to_string(),
        engagement_trend: engagement_trend.to_string(),
    }
}

// ============================================
// Loyalty
// ============================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LoyaltyInputs {
    pub tenure_days: i64,
    pub unique_game_types: i64,
    pub total_games: i64,
    pub window_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyScore {
    pub score: f64,
    pub tenure_days: i64,
    pub tenure_score: f64,
    pub game_loyalty: f64,
    pub brand_loyalty: f64,
    pub churn_probability: f64,
    pub retention_category: String,
    pub loyalty_trend: String,
}

/// Coarse three-tier churn heuristic: `(probability, retention category)`.
pub fn churn_tier(tenure_score: f64, total_games: i64) -> (f64, &'static str) {
    if tenure_score > 80.0 && total_games > 50 {
        (0.1, "loyal")
    } else if tenure_score > 50.0 && total_games > 20 {
        (0.3, "regular")
    } else {
        (0.6, "new")
    }
}

pub fn loyalty_score(input: &LoyaltyInputs) -> LoyaltyScore {
    let tenure_days = input.tenure_days.max(0);
    let tenure_score = clamp_score(tenure_days as f64 / 365.0 * 100.0);

    let game_loyalty = if input.unique_game_types > 0 && input.total_games > 0 {
        let diversity_ratio = input.unique_game_types as f64 / input.total_games as f64;
        clamp_score(100.0 - diversity_ratio * 100.0)
    } else {
        0.0
    };

    let brand_loyalty = if input.window_days > 0 {
        clamp_score(input.total_games as f64 / input.window_days as f64 * 100.0)
    } else {
        0.0
    };

    let (churn_probability, retention_category) = churn_tier(tenure_score, input.total_games);
    let loyalty_trend = if churn_probability < 0.3 {
        "stable"
    } else {
        "declining"
    };

    LoyaltyScore {
        score: clamp_score(tenure_score * 0.4 + game_loyalty * 0.3 + brand_loyalty * 0.3),
        tenure_days,
        tenure_score,
        game_loyalty,
        brand_loyalty,
        churn_probability,
        retention_category: retention_category.to_string(),
        loyalty_trend: loyalty_trend.to_string(),
    }
}

// ============================================
// Spending
// ============================================

#[derive(Debug, Clone, Default)]
pub struct SpendingInputs {
    pub deposit_total: f64,
    pub deposit_count: i64,
    pub window_days: i64,
    /// Individual deposit amounts, for stability
    pub deposit_amounts: Vec<f64>,
    pub first_half_total: f64,
    pub second_half_total: f64,
    pub completed_deposits: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingScore {
    pub score: f64,
    pub total_spending: f64,
    pub spending_volume: f64,
    pub spending_frequency: f64,
    pub spending_stability: f64,
    pub spending_growth: f64,
    pub payment_reliability: f64,
    pub spending_category: String,
}

pub fn spending_category(total: f64) -> &'static str {
    if total >= 5000.0 {
        "high_spender"
    } else if total >= 1000.0 {
        "medium_spender"
    } else if total > 0.0 {
        "low_spender"
    } else {
        "non_spender"
    }
}

/// Spending score over deposits. A player with no deposits scores 0 on
/// every component.
pub fn spending_score(input: &SpendingInputs) -> SpendingScore {
    if input.deposit_count == 0 {
        return SpendingScore {
            score: 0.0,
            total_spending: 0.0,
            spending_volume: 0.0,
            spending_frequency: 0.0,
            spending_stability: 0.0,
            spending_growth: 0.0,
            payment_reliability: 0.0,
            spending_category: spending_category(0.0).to_string(),
        };
    }

    let spending_volume = clamp_score(input.deposit_total / 10_000.0 * 100.0);

    let spending_frequency = if input.window_days > 0 {
        let monthly = input.deposit_count as f64 / input.window_days as f64 * 30.0;
        clamp_score(monthly * 10.0)
    } else {
        0.0
    };

    let average = input.deposit_total / input.deposit_count as f64;
    let spending_stability = if input.deposit_count > 1 && average > 0.0 {
        clamp_score(100.0 - coefficient_of_variation(&input.deposit_amounts) * 100.0)
    } else {
        50.0
    };

    // Growth is centred on 50 (flat)
    let spending_growth = if input.first_half_total > 0.0 {
        let growth_rate =
            (input.second_half_total - input.first_half_total) / input.first_half_total * 100.0;
        clamp_score(growth_rate + 50.0)
    } else {
        50.0
    };

    let payment_reliability = clamp_score(percentage(
        input.completed_deposits as f64,
        input.deposit_count as f64,
    ));

    SpendingScore {
        score: clamp_score(
            spending_volume * 0.3
                + spending_frequency * 0.2
                + spending_stability * 0.2
                + spending_growth * 0.15
                + payment_reliability * 0.15,
        ),
        total_spending: input.deposit_total,
        spending_volume,
        spending_frequency,
        spending_stability,
        spending_growth,
        payment_reliability,
        spending_category: spending_category(input.deposit_total).to_string(),
    }
}

// ============================================
// Risk (lower is better)
// ============================================

#[derive(Debug, Clone, Copy)]
pub struct RiskInputs {
    pub unique_login_hours: i64,
    pub average_bet: f64,
    pub max_bet: f64,
    pub large_deposits: i64,
    pub deposit_total: f64,
    pub withdrawal_total: f64,
    pub verification_level: VerificationLevel,
    pub unique_ips: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: f64,
    pub behavior_risk: f64,
    pub financial_risk: f64,
    pub compliance_risk: f64,
    pub fraud_risk: f64,
    pub risk_category: String,
    pub risk_factors: Vec<String>,
}

pub fn risk_category(score: f64) -> &'static str {
    if score >= 70.0 {
        "high_risk"
    } else if score >= 40.0 {
        "medium_risk"
    } else if score >= 20.0 {
        "low_risk"
    } else {
        "minimal_risk"
    }
}

pub fn risk_score(input: &RiskInputs) -> RiskScore {
    let mut factors = Vec::new();

    let mut behavior_risk = 0.0;
    if input.unique_login_hours > 20 {
        behavior_risk += 20.0;
        factors.push("Unusual login time pattern".to_string());
    }
    if input.average_bet > 0.0 && input.max_bet / input.average_bet > 10.0 {
        behavior_risk += 25.0;
        factors.push("High bet size volatility".to_string());
    }

    let mut financial_risk = 0.0;
    if input.large_deposits > 5 {
        financial_risk += 30.0;
        factors.push("Frequent large deposits".to_string());
    }
    if input.deposit_total > 0.0 && input.withdrawal_total / input.deposit_total > 0.9 {
        financial_risk += 20.0;
        factors.push("High withdrawal ratio".to_string());
    }

    let compliance_risk = match input.verification_level {
        VerificationLevel::None => {
            factors.push("Account not verified".to_string());
            40.0
        }
        VerificationLevel::Email => {
            factors.push("Email-only verification".to_string());
            20.0
        }
        VerificationLevel::Phone | VerificationLevel::Identity => 0.0,
    };

    let mut fraud_risk = 0.0;
    if input.unique_ips > 10 {
        fraud_risk += 25.0;
        factors.push("Logins from many IP addresses".to_string());
    }

    let behavior_risk = clamp_score(behavior_risk);
    let financial_risk = clamp_score(financial_risk);
    let compliance_risk = clamp_score(compliance_risk);
    let fraud_risk = clamp_score(fraud_risk);
    let score = clamp_score((behavior_risk + financial_risk + compliance_risk + fraud_risk) / 4.0);

    RiskScore {
        score,
        behavior_risk,
        financial_risk,
        compliance_risk,
        fraud_risk,
        risk_category: risk_category(score).to_string(),
        risk_factors: factors,
    }
}

// ============================================
// Profitability
// ============================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitabilityInputs {
    /// `bets - wins` over the window
    pub gaming_revenue: f64,
    pub fee_total: f64,
    pub deposit_total: f64,
    pub tenure_days: i64,
    pub first_half_gaming_revenue: f64,
    pub second_half_gaming_revenue: f64,
    pub acquisition_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityScore {
    pub score: f64,
    pub platform_revenue: f64,
    pub revenue_contribution: f64,
    pub profit_margin: f64,
    pub lifetime_value: f64,
    pub roi_score: f64,
    pub profitability_trend: String,
}

/// Days of future revenue projected into lifetime value.
pub const LIFETIME_PROJECTION_DAYS: f64 = 180.0;

pub fn profitability_score(input: &ProfitabilityInputs) -> ProfitabilityScore {
    let platform_revenue = input.gaming_revenue + input.fee_total;

    let revenue_contribution = clamp_score(platform_revenue / 1000.0 * 100.0);

    let profit_margin = if input.deposit_total > 0.0 {
        clamp_score(platform_revenue / input.deposit_total * 100.0)
    } else {
        0.0
    };

    let lifetime_value = if input.tenure_days > 0 {
        platform_revenue / input.tenure_days as f64 * LIFETIME_PROJECTION_DAYS
    } else {
        0.0
    };

    let roi_score = if input.acquisition_cost > 0.0 {
        let roi = (platform_revenue - input.acquisition_cost) / input.acquisition_cost * 100.0;
        clamp_score(roi + 50.0)
    } else {
        0.0
    };

    let profitability_trend = if input.first_half_gaming_revenue > input.second_half_gaming_revenue
    {
        "decreasing"
    } else if input.second_half_gaming_revenue > input.first_half_gaming_revenue {
        "increasing"
    } else {
        "stable"
    };

    // 500 of projected value saturates the lifetime component
    let lifetime_component = clamp_score(lifetime_value / 500.0 * 100.0);

    ProfitabilityScore {
        score: clamp_score(
            revenue_contribution * 0.4
                + profit_margin * 0.2
                + lifetime_component * 0.2
                + roi_score * 0.2,
        ),
        platform_revenue,
        revenue_contribution,
        profit_margin,
        lifetime_value,
        roi_score,
        profitability_trend: profitability_trend.to_string(),
    }
}

// ============================================
// Overall value
// ============================================

/// Weighted overall value with risk inverted, normalized by the weight sum.
pub fn overall_value_score(
    activity: f64,
    loyalty: f64,
    spending: f64,
    risk: f64,
    profitability: f64,
    weights: &ScoreWeights,
) -> f64 {
    let weighted = activity * weights.activity_weight
        + loyalty * weights.loyalty_weight
        + spending * weights.spending_weight
        + (100.0 - risk) * weights.risk_weight
        + profitability * weights.profitability_weight;
    let total_weight = match weights.total() {
        w if w > 0.0 => w,
        _ => 1.0,
    };
    clamp_score(weighted / total_weight)
}

/// Value tier; each lower bound is inclusive.
pub fn value_category(overall_score: f64) -> &'static str {
    if overall_score >= 80.0 {
        "VIP"
    } else if overall_score >= 60.0 {
        "High"
    } else if overall_score >= 40.0 {
        "Medium"
    } else {
        "Low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_duration_fit() {
        assert_eq!(session_duration_fit(45.0), 30.0);
        assert_eq!(session_duration_fit(30.0), 30.0);
        assert_eq!(session_duration_fit(60.0), 30.0);
        assert_eq!(session_duration_fit(20.0), 25.0);
        assert_eq!(session_duration_fit(80.0), 20.0);
        assert_eq!(session_duration_fit(500.0), 0.0);
        assert_eq!(session_duration_fit(0.0), 0.0);
    }

    #[test]
    fn test_profit_component() {
        assert_eq!(profit_component(100.0, 150.0), 10.0);
        assert_eq!(profit_component(100.0, 50.0), 5.0);
        assert_eq!(profit_component(100.0, 0.0), 0.0);
        assert_eq!(profit_component(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_game_preference_score_bounded() {
        let score = game_preference_score(100.0, 45.0, 100.0, 10.0, 1e12);
        assert_eq!(score, 100.0);
        let score = game_preference_score(50.0, 45.0, 50.0, 100.0, 100.0);
        // 20 + 30 + 20 + 10
        assert_eq!(score, 80.0);
    }

    #[test]
    fn test_diversity_index() {
        assert_eq!(diversity_index(&[]), 0.0);
        assert_eq!(diversity_index(&[50]), 0.0);
        assert_eq!(diversity_index(&[50, 0]), 0.0);
        assert!((diversity_index(&[10, 10, 10, 10]) - 1.0).abs() < 1e-9);
        let skewed = diversity_index(&[90, 5, 5]);
        assert!(skewed > 0.0 && skewed < 1.0);
    }

    #[test]
    fn test_specialization_level() {
        assert_eq!(specialization_level(0.0), "focused");
        assert_eq!(specialization_level(0.3), "specialist");
        assert_eq!(specialization_level(0.7), "generalist");
    }

    #[test]
    fn test_hourly_activity_level() {
        assert_eq!(hourly_activity_level(0), "inactive");
        assert_eq!(hourly_activity_level(5), "low");
        assert_eq!(hourly_activity_level(15), "medium");
        assert_eq!(hourly_activity_level(30), "high");
        assert_eq!(hourly_activity_level(31), "peak");
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(time_of_day(6), "morning");
        assert_eq!(time_of_day(12), "afternoon");
        assert_eq!(time_of_day(23), "evening");
        assert_eq!(time_of_day(3), "night");
    }

    #[test]
    fn test_dispersion_helpers() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn test_activity_score_empty() {
        let score = activity_score(&ActivityInputs {
            window_days: 90,
            ..Default::default()
        });
        assert_eq!(score.score, 0.0);
        assert_eq!(score.last_activity_days, NO_ACTIVITY_DAYS);
        assert_eq!(score.consistency_level, "low");
        assert_eq!(score.engagement_trend, "decreasing");
    }

    #[test]
    fn test_activity_score_saturates() {
        let score = activity_score(&ActivityInputs {
            login_days: 1_000,
            window_days: 30,
            total_games: 1_000_000,
            average_session_minutes: 1e9,
            last_activity_days: Some(0),
        });
        assert_eq!(score.login_frequency, 100.0);
        assert_eq!(score.score, 100.0);
        assert_eq!(score.consistency_level, "high");
        assert_eq!(score.engagement_trend, "increasing");
    }

    #[test]
    fn test_loyal_churn_tier() {
        let score = loyalty_score(&LoyaltyInputs {
            tenure_days: 400,
            unique_game_types: 2,
            total_games: 60,
            window_days: 90,
        });
        assert_eq!(score.churn_probability, 0.1);
        assert_eq!(score.retention_category, "loyal");
        assert_eq!(score.loyalty_trend, "stable");
        assert_eq!(score.tenure_score, 100.0);
    }

    #[test]
    fn test_churn_tiers() {
        assert_eq!(churn_tier(60.0, 30), (0.3, "regular"));
        assert_eq!(churn_tier(90.0, 10), (0.6, "new"));
    }

    #[test]
    fn test_spending_score_zero_without_deposits() {
        let score = spending_score(&SpendingInputs {
            window_days: 90,
            ..Default::default()
        });
        assert_eq!(score.score, 0.0);
        assert_eq!(score.payment_reliability, 0.0);
        assert_eq!(score.spending_category, "non_spender");
    }

    #[test]
    fn test_spending_score_single_deposit_defaults() {
        let score = spending_score(&SpendingInputs {
            deposit_total: 500.0,
            deposit_count: 1,
            window_days: 90,
            deposit_amounts: vec![500.0],
            first_half_total: 0.0,
            second_half_total: 500.0,
            completed_deposits: 1,
        });
        assert_eq!(score.spending_volume, 5.0);
        assert_eq!(score.spending_stability, 50.0);
        assert_eq!(score.spending_growth, 50.0);
        assert_eq!(score.payment_reliability, 100.0);
        assert_eq!(score.spending_category, "low_spender");
    }

    #[test]
    fn test_spending_growth_clamped() {
        let score = spending_score(&SpendingInputs {
            deposit_total: 1e9,
            deposit_count: 2,
            window_days: 90,
            deposit_amounts: vec![1.0, 1e9],
            first_half_total: 1.0,
            second_half_total: 1e9,
            completed_deposits: 2,
        });
        assert_eq!(score.spending_growth, 100.0);
        assert_eq!(score.spending_volume, 100.0);
        assert!(score.score <= 100.0);
    }

    #[test]
    fn test_risk_score() {
        let score = risk_score(&RiskInputs {
            unique_login_hours: 22,
            average_bet: 10.0,
            max_bet: 500.0,
            large_deposits: 6,
            deposit_total: 100.0,
            withdrawal_total: 95.0,
            verification_level: VerificationLevel::None,
            unique_ips: 11,
        });
        assert_eq!(score.behavior_risk, 45.0);
        assert_eq!(score.financial_risk, 50.0);
        assert_eq!(score.compliance_risk, 40.0);
        assert_eq!(score.fraud_risk, 25.0);
        assert_eq!(score.score, 40.0);
        assert_eq!(score.risk_category, "medium_risk");
        assert_eq!(score.risk_factors.len(), 6);
    }

    #[test]
    fn test_profitability_score() {
        let score = profitability_score(&ProfitabilityInputs {
            gaming_revenue: 400.0,
            fee_total: 100.0,
            deposit_total: 1000.0,
            tenure_days: 180,
            first_half_gaming_revenue: 100.0,
            second_half_gaming_revenue: 300.0,
            acquisition_cost: 50.0,
        });
        assert_eq!(score.platform_revenue, 500.0);
        assert_eq!(score.revenue_contribution, 50.0);
        assert_eq!(score.profit_margin, 50.0);
        assert_eq!(score.lifetime_value, 500.0);
        assert_eq!(score.roi_score, 100.0);
        assert_eq!(score.profitability_trend, "increasing");
        // 0.4×50 + 0.2×50 + 0.2×100 + 0.2×100
        assert!((score.score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_profitability_negative_revenue_floors() {
        let score = profitability_score(&ProfitabilityInputs {
            gaming_revenue: -1e9,
            deposit_total: 10.0,
            tenure_days: 10,
            acquisition_cost: 50.0,
            ..Default::default()
        });
        assert_eq!(score.revenue_contribution, 0.0);
        assert_eq!(score.profit_margin, 0.0);
        assert_eq!(score.score, 0.0);
    }

    #[test]
    fn test_overall_value_score() {
        let weights = ScoreWeights::default();
        let score = overall_value_score(100.0, 100.0, 100.0, 0.0, 100.0, &weights);
        assert!((score - 100.0).abs() < 1e-9);

        let zero = ScoreWeights {
            activity_weight: 0.0,
            loyalty_weight: 0.0,
            spending_weight: 0.0,
            risk_weight: 0.0,
            profitability_weight: 0.0,
        };
        assert_eq!(overall_value_score(50.0, 50.0, 50.0, 50.0, 50.0, &zero), 0.0);

        let huge = overall_value_score(1e12, 1e12, 1e12, -1e12, 1e12, &weights);
        assert_eq!(huge, 100.0);
    }

    #[test]
    fn test_value_category_breakpoints() {
        assert_eq!(value_category(85.0), "VIP");
        assert_eq!(value_category(80.0), "VIP");
        assert_eq!(value_category(79.9), "High");
        assert_eq!(value_category(60.0), "High");
        assert_eq!(value_category(55.0), "Medium");
        assert_eq!(value_category(40.0), "Medium");
        assert_eq!(value_category(35.0), "Low");
    }
}
