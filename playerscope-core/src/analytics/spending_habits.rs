//! Spending habits analysis
//!
//! Six sub-reports over fixed trailing windows, independent of any requested
//! time range:
//!
//! | Report | Window | Transaction types |
//! |--------|--------|-------------------|
//! | frequency | 30 days | deposit, bet, purchase |
//! | amount | 90 days | deposit, bet, purchase (positive amounts) |
//! | time pattern | 30 days | deposit, bet, purchase |
//! | channel | 60 days | deposit, bet, purchase, withdrawal |
//! | risk | 30 / 7 days | deposit, bet |
//! | capacity | 90 days | deposit |
//!
//! A failing sub-report is replaced by an error-flagged placeholder; the
//! analysis as a whole only fails when the player does not exist.

use super::persistence::{persist_best_effort, AnalysisKind, AnalysisRecord};
use super::scoring::percentage;
use super::store::{CountTotal, PlayerStore};
use super::window::AnalysisWindow;
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::types::{PlayerId, TransactionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

const SPENDING_TYPES: &[TransactionType] = &[
    TransactionType::Deposit,
    TransactionType::Bet,
    TransactionType::Purchase,
];

const CHANNEL_TYPES: &[TransactionType] = &[
    TransactionType::Deposit,
    TransactionType::Bet,
    TransactionType::Purchase,
    TransactionType::Withdrawal,
];

const RISK_TYPES: &[TransactionType] = &[TransactionType::Deposit, TransactionType::Bet];

/// Amount above which a deposit or bet counts as large.
const LARGE_TRANSACTION: f64 = 1000.0;

/// Stored in the history table's `time_range` column.
const FIXED_WINDOWS: &str = "fixed";

// ============================================
// Sub-reports
// ============================================

/// Sub-report that can stand in for itself when its query fails.
trait Degradable {
    fn failed(message: String) -> Self;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingFrequency {
    pub total_days_active: i64,
    pub total_transactions: i64,
    pub average_daily_transactions: f64,
    /// low, medium, high, very_high (unknown on error)
    pub frequency_level: String,
    /// Newest day first
    pub daily_spending_details: Vec<DailySpendingDetail>,
    pub analysis_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpendingDetail {
    pub date: String,
    pub transaction_count: i64,
    pub spending_amount: f64,
}

impl Degradable for SpendingFrequency {
    fn failed(message: String) -> Self {
        Self {
            total_days_active: 0,
            total_transactions: 0,
            average_daily_transactions: 0.0,
            frequency_level: "unknown".to_string(),
            daily_spending_details: Vec::new(),
            analysis_period: "30 days".to_string(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingAmount {
    pub min_amount: f64,
    pub max_amount: f64,
    pub average_amount: f64,
    pub total_amount: f64,
    pub transaction_count: i64,
    /// minimal, low_value, medium_value, high_value (unknown on error)
    pub spending_level: String,
    pub amount_ranges: AmountRanges,
    pub analysis_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Small ≤100, medium ≤500, large ≤1000, very large above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountRanges {
    pub small: RangeTotal,
    pub medium: RangeTotal,
    pub large: RangeTotal,
    pub very_large: RangeTotal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeTotal {
    pub count: i64,
    pub total: f64,
}

impl From<CountTotal> for RangeTotal {
    fn from(ct: CountTotal) -> Self {
        Self {
            count: ct.count,
            total: ct.total,
        }
    }
}

impl Degradable for SpendingAmount {
    fn failed(message: String) -> Self {
        Self {
            min_amount: 0.0,
            max_amount: 0.0,
            average_amount: 0.0,
            total_amount: 0.0,
            transaction_count: 0,
            spending_level: "unknown".to_string(),
            amount_ranges: AmountRanges::default(),
            analysis_period: "90 days".to_string(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingTimePattern {
    /// Hours with at least one transaction, ascending
    pub hourly_pattern: Vec<HourlySpending>,
    /// Days with at least one transaction, Sunday first
    pub weekly_pattern: Vec<WeekdaySpending>,
    pub peak_spending_hours: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySpending {
    pub hour: u32,
    pub transaction_count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdaySpending {
    /// 0 = Sunday
    pub day_of_week: u32,
    pub day_name: String,
    pub transaction_count: i64,
    pub total_amount: f64,
}

impl Degradable for SpendingTimePattern {
    fn failed(message: String) -> Self {
        Self {
            hourly_pattern: Vec::new(),
            weekly_pattern: Vec::new(),
            peak_spending_hours: vec!["No data available".to_string()],
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingChannel {
    /// Keyed by transaction type
    pub channels: BTreeMap<String, ChannelShare>,
    pub total_transactions: i64,
    pub total_amount: f64,
    pub analysis_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelShare {
    pub count: i64,
    pub total: f64,
    pub average: f64,
    /// Share of transaction count, in percent
    pub percentage: f64,
}

impl Degradable for SpendingChannel {
    fn failed(message: String) -> Self {
        Self {
            channels: BTreeMap::new(),
            total_transactions: 0,
            total_amount: 0.0,
            analysis_period: "60 days".to_string(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRisk {
    pub risk_score: u32,
    /// low, medium, high (unknown on error)
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub large_transaction_count: i64,
    /// Distinct spending days in the last 7
    pub consecutive_spending_days: i64,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Degradable for SpendingRisk {
    fn failed(message: String) -> Self {
        Self {
            risk_score: 0,
            risk_level: "unknown".to_string(),
            risk_factors: Vec::new(),
            large_transaction_count: 0,
            consecutive_spending_days: 0,
            recommendations: risk_recommendations(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingCapacity {
    pub total_deposits_90d: f64,
    pub average_deposit: f64,
    /// basic, medium, high, premium (unknown on error)
    pub capacity_level: String,
    pub estimated_monthly_budget: f64,
    pub analysis_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Degradable for SpendingCapacity {
    fn failed(message: String) -> Self {
        Self {
            total_deposits_90d: 0.0,
            average_deposit: 0.0,
            capacity_level: "unknown".to_string(),
            estimated_monthly_budget: 0.0,
            analysis_period: "90 days".to_string(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingHabitsAnalysis {
    pub player_id: PlayerId,
    pub username: String,
    pub analysis_date: DateTime<Utc>,
    pub spending_frequency: SpendingFrequency,
    pub spending_amount: SpendingAmount,
    pub spending_time_pattern: SpendingTimePattern,
    pub spending_channel: SpendingChannel,
    pub spending_risk: SpendingRisk,
    pub spending_capacity: SpendingCapacity,
    pub recommended_actions: Vec<String>,
    pub summary: String,
}

// ============================================
// Analyzer
// ============================================

/// Builds a [`SpendingHabitsAnalysis`] from a [`PlayerStore`].
#[derive(Clone)]
pub struct SpendingHabitsAnalyzer {
    store: Arc<dyn PlayerStore>,
    config: AnalyticsConfig,
}

impl SpendingHabitsAnalyzer {
    pub fn new(store: Arc<dyn PlayerStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn analyze(&self, player_id: PlayerId) -> Result<SpendingHabitsAnalysis> {
        self.analyze_at(player_id, Utc::now())
    }

    /// Run the analysis with every trailing window ending at `now`.
    pub fn analyze_at(
        &self,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<SpendingHabitsAnalysis> {
        let started = Instant::now();
        let store = self.store.as_ref();

        let player = store
            .find_player(player_id)?
            .ok_or(Error::PlayerNotFound(player_id))?;

        tracing::debug!(player_id, "Analyzing spending habits");

        let spending_frequency = or_flagged(
            "spending frequency",
            player_id,
            spending_frequency(store, player_id, now),
        );
        let spending_amount = or_flagged(
            "spending amount",
            player_id,
            spending_amount(store, player_id, now),
        );
        let spending_time_pattern = or_flagged(
            "spending time pattern",
            player_id,
            spending_time_pattern(store, player_id, now),
        );
        let spending_channel = or_flagged(
            "spending channel",
            player_id,
            spending_channel(store, player_id, now),
        );
        let spending_risk = or_flagged(
            "spending risk",
            player_id,
            spending_risk(store, player_id, now),
        );
        let spending_capacity = or_flagged(
            "spending capacity",
            player_id,
            spending_capacity(store, player_id, now),
        );

        let mut analysis = SpendingHabitsAnalysis {
            player_id,
            username: player.username,
            analysis_date: now,
            spending_frequency,
            spending_amount,
            spending_time_pattern,
            spending_channel,
            spending_risk,
            spending_capacity,
            recommended_actions: Vec::new(),
            summary: String::new(),
        };
        analysis.recommended_actions = recommended_actions(&analysis);
        analysis.summary = summary(&analysis);

        tracing::info!(
            player_id,
            spending_level = %analysis.spending_amount.spending_level,
            risk_level = %analysis.spending_risk.risk_level,
            duration_ms = started.elapsed().as_millis() as u64,
            "Spending habits analysis complete"
        );

        if self.config.persist_results {
            match AnalysisRecord::from_analysis(
                AnalysisKind::SpendingHabits,
                player_id,
                FIXED_WINDOWS,
                &analysis,
                now,
            ) {
                Ok(record) => {
                    let record = record.with_label(analysis.spending_amount.spending_level.clone());
                    persist_best_effort(store, &record);
                }
                Err(e) => {
                    tracing::warn!(error = %e, player_id, "Failed to serialize analysis");
                }
            }
        }

        Ok(analysis)
    }
}

fn or_flagged<T: Degradable>(section: &str, player_id: PlayerId, result: Result<T>) -> T {
    match result {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, player_id, section, "Spending sub-report degraded");
            T::failed(format!("Failed to analyze {}", section))
        }
    }
}

fn trailing(now: DateTime<Utc>, days: i64) -> AnalysisWindow {
    AnalysisWindow::trailing(now, days)
}

// ============================================
// Sub-report builders
// ============================================

fn frequency_level(average_daily_transactions: f64) -> &'static str {
    if average_daily_transactions >= 10.0 {
        "very_high"
    } else if average_daily_transactions >= 5.0 {
        "high"
    } else if average_daily_transactions >= 2.0 {
        "medium"
    } else {
        "low"
    }
}

fn spending_frequency(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingFrequency> {
    let days = store.daily_spending(player_id, trailing(now, 30), SPENDING_TYPES)?;

    let total_days_active = days.len() as i64;
    let total_transactions: i64 = days.iter().map(|d| d.transactions).sum();
    let average_daily_transactions = if total_days_active > 0 {
        total_transactions as f64 / total_days_active as f64
    } else {
        0.0
    };

    Ok(SpendingFrequency {
        total_days_active,
        total_transactions,
        average_daily_transactions,
        frequency_level: frequency_level(average_daily_transactions).to_string(),
        daily_spending_details: days
            .into_iter()
            .map(|d| DailySpendingDetail {
                date: d.date,
                transaction_count: d.transactions,
                spending_amount: d.amount,
            })
            .collect(),
        analysis_period: "30 days".to_string(),
        error: None,
    })
}

/// Value tier from total and average amount; either threshold qualifies.
pub fn spending_level(total: f64, average: f64) -> &'static str {
    if total >= 10_000.0 || average >= 500.0 {
        "high_value"
    } else if total >= 5000.0 || average >= 200.0 {
        "medium_value"
    } else if total >= 1000.0 || average >= 50.0 {
        "low_value"
    } else {
        "minimal"
    }
}

fn spending_amount(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingAmount> {
    let window = trailing(now, 90);
    let summary = store.amount_summary(player_id, window, SPENDING_TYPES)?;
    let [small, medium, large, very_large] =
        store.amount_buckets(player_id, window, SPENDING_TYPES)?;

    Ok(SpendingAmount {
        min_amount: summary.min,
        max_amount: summary.max,
        average_amount: summary.average,
        total_amount: summary.total,
        transaction_count: summary.count,
        spending_level: spending_level(summary.total, summary.average).to_string(),
        amount_ranges: AmountRanges {
            small: small.into(),
            medium: medium.into(),
            large: large.into(),
            very_large: very_large.into(),
        },
        analysis_period: "90 days".to_string(),
        error: None,
    })
}

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// The single hour with the largest total amount, as `HH:00-HH:59`.
fn peak_spending_hours(hourly: &[HourlySpending]) -> Vec<String> {
    if hourly.is_empty() {
        return vec!["No data available".to_string()];
    }

    let mut peak: Option<&HourlySpending> = None;
    for hour in hourly {
        if hour.total_amount > peak.map_or(0.0, |p| p.total_amount) {
            peak = Some(hour);
        }
    }

    match peak {
        Some(p) => vec![format!("{:02}:00-{:02}:59", p.hour, p.hour)],
        None => vec!["No significant peak detected".to_string()],
    }
}

fn spending_time_pattern(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingTimePattern> {
    let window = trailing(now, 30);
    let hours = store.hourly_spending(player_id, window, SPENDING_TYPES)?;
    let weekdays = store.weekday_spending(player_id, window, SPENDING_TYPES)?;

    let hourly_pattern: Vec<HourlySpending> = hours
        .iter()
        .enumerate()
        .filter(|(_, ct)| ct.count > 0)
        .map(|(hour, ct)| HourlySpending {
            hour: hour as u32,
            transaction_count: ct.count,
            total_amount: ct.total,
        })
        .collect();

    let weekly_pattern = weekdays
        .iter()
        .zip(DAY_NAMES)
        .enumerate()
        .filter(|(_, (ct, _))| ct.count > 0)
        .map(|(day, (ct, name))| WeekdaySpending {
            day_of_week: day as u32,
            day_name: name.to_string(),
            transaction_count: ct.count,
            total_amount: ct.total,
        })
        .collect();

    Ok(SpendingTimePattern {
        peak_spending_hours: peak_spending_hours(&hourly_pattern),
        hourly_pattern,
        weekly_pattern,
        error: None,
    })
}

fn spending_channel(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingChannel> {
    let totals = store.channel_totals(player_id, trailing(now, 60), CHANNEL_TYPES)?;

    let total_transactions: i64 = totals.iter().map(|c| c.count).sum();
    let total_amount: f64 = totals.iter().map(|c| c.total).sum();

    let channels = totals
        .into_iter()
        .map(|c| {
            (
                c.transaction_type.as_str().to_string(),
                ChannelShare {
                    count: c.count,
                    total: c.total,
                    average: c.average,
                    percentage: percentage(c.count as f64, total_transactions as f64),
                },
            )
        })
        .collect();

    Ok(SpendingChannel {
        channels,
        total_transactions,
        total_amount,
        analysis_period: "60 days".to_string(),
        error: None,
    })
}

fn risk_recommendations() -> Vec<String> {
    vec![
        "Monitor spending patterns closely".to_string(),
        "Consider setting spending limits".to_string(),
        "Provide responsible gaming reminders".to_string(),
    ]
}

fn spending_risk(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingRisk> {
    let large_transaction_count = store.large_transaction_count(
        player_id,
        trailing(now, 30),
        RISK_TYPES,
        LARGE_TRANSACTION,
    )?;
    let consecutive_spending_days =
        store.active_spending_days(player_id, trailing(now, 7), RISK_TYPES)?;

    let mut risk_score = 0;
    let mut risk_factors = Vec::new();
    if large_transaction_count > 5 {
        risk_score += 30;
        risk_factors.push("Frequent large transactions".to_string());
    }
    if consecutive_spending_days >= 7 {
        risk_score += 25;
        risk_factors.push("Continuous daily spending".to_string());
    }

    let risk_level = if risk_score >= 50 {
        "high"
    } else if risk_score >= 25 {
        "medium"
    } else {
        "low"
    };

    Ok(SpendingRisk {
        risk_score,
        risk_level: risk_level.to_string(),
        risk_factors,
        large_transaction_count,
        consecutive_spending_days,
        recommendations: risk_recommendations(),
        error: None,
    })
}

pub fn capacity_level(total_deposits: f64) -> &'static str {
    if total_deposits >= 50_000.0 {
        "premium"
    } else if total_deposits >= 20_000.0 {
        "high"
    } else if total_deposits >= 5000.0 {
        "medium"
    } else {
        "basic"
    }
}

fn spending_capacity(
    store: &dyn PlayerStore,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<SpendingCapacity> {
    let ledger = store.ledger_totals(player_id, trailing(now, 90))?;

    Ok(SpendingCapacity {
        total_deposits_90d: ledger.deposit_total,
        average_deposit: ledger.average_deposit(),
        capacity_level: capacity_level(ledger.deposit_total).to_string(),
        // 90 days is three months
        estimated_monthly_budget: ledger.deposit_total / 3.0,
        analysis_period: "90 days".to_string(),
        error: None,
    })
}

// ============================================
// Text
// ============================================

fn recommended_actions(analysis: &SpendingHabitsAnalysis) -> Vec<String> {
    let mut actions = vec![
        "Keep monitoring spending patterns to personalize service".to_string(),
        "Adjust marketing strategy to the player's spending habits".to_string(),
        "Provide responsible gaming reminders and safeguards".to_string(),
    ];

    if analysis.spending_risk.risk_level == "high" {
        actions.push(
            "Spending risk is high; review limits and reach out with responsible gaming support"
                .to_string(),
        );
    }
    if analysis.spending_capacity.capacity_level == "premium" {
        actions.push("Premium spending capacity; consider dedicated VIP account management".to_string());
    }

    actions
}

fn summary(analysis: &SpendingHabitsAnalysis) -> String {
    format!(
        "Spending analysis complete: active on {} of the last 30 days ({} frequency), \
         {} spending level over 90 days, {} spending risk, {} spending capacity.",
        analysis.spending_frequency.total_days_active,
        analysis.spending_frequency.frequency_level,
        analysis.spending_amount.spending_level,
        analysis.spending_risk.risk_level,
        analysis.spending_capacity.capacity_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_level() {
        assert_eq!(frequency_level(0.0), "low");
        assert_eq!(frequency_level(2.0), "medium");
        assert_eq!(frequency_level(5.0), "high");
        assert_eq!(frequency_level(10.0), "very_high");
    }

    #[test]
    fn test_spending_level_either_threshold() {
        assert_eq!(spending_level(0.0, 0.0), "minimal");
        assert_eq!(spending_level(200.0, 600.0), "high_value");
        assert_eq!(spending_level(5000.0, 10.0), "medium_value");
        assert_eq!(spending_level(999.0, 50.0), "low_value");
    }

    #[test]
    fn test_capacity_level() {
        assert_eq!(capacity_level(0.0), "basic");
        assert_eq!(capacity_level(5000.0), "medium");
        assert_eq!(capacity_level(20_000.0), "high");
        assert_eq!(capacity_level(50_000.0), "premium");
    }

    #[test]
    fn test_peak_spending_hours() {
        assert_eq!(peak_spending_hours(&[]), vec!["No data available"]);

        let hours = [
            HourlySpending {
                hour: 9,
                transaction_count: 1,
                total_amount: 50.0,
            },
            HourlySpending {
                hour: 21,
                transaction_count: 2,
                total_amount: 400.0,
            },
        ];
        assert_eq!(peak_spending_hours(&hours), vec!["21:00-21:59"]);

        let zero = [HourlySpending {
            hour: 3,
            transaction_count: 1,
            total_amount: 0.0,
        }];
        assert_eq!(
            peak_spending_hours(&zero),
            vec!["No significant peak detected"]
        );
    }

    #[test]
    fn test_degraded_placeholder_is_flagged() {
        let report: SpendingRisk = or_flagged(
            "spending risk",
            1,
            Err(Error::Database(rusqlite::Error::InvalidQuery)),
        );
        assert_eq!(report.risk_level, "unknown");
        assert_eq!(
            report.error.as_deref(),
            Some("Failed to analyze spending risk")
        );
        assert_eq!(report.recommendations.len(), 3);

        let json = serde_json::to_value(SpendingCapacity::failed("x".into())).unwrap();
        assert_eq!(json["error"], "x");
    }
}
