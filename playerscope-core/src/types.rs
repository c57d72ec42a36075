//! Core domain types for playerscope
//!
//! These types mirror the records owned by the gaming platform's store. The
//! analyzers only read them; inserts exist for seeding and tests.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Player** | A registered account on the platform |
//! | **Login** | One authenticated visit, carrying the client IP |
//! | **Game session** | One continuous period a player spends in a game of a given type |
//! | **Round** | One discrete bet and its outcome within a game session |
//! | **Transaction** | One ledger entry (deposit, withdrawal, bet, purchase, fee) |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of a player row.
pub type PlayerId = i64;

// ============================================
// Player
// ============================================

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Inactive,
    Suspended,
    Deleted,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::Inactive => "inactive",
            PlayerStatus::Suspended => "suspended",
            PlayerStatus::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for PlayerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PlayerStatus::Active),
            "inactive" => Ok(PlayerStatus::Inactive),
            "suspended" => Ok(PlayerStatus::Suspended),
            "deleted" => Ok(PlayerStatus::Deleted),
            _ => Err(format!("unknown player status: {}", s)),
        }
    }
}

/// KYC verification level reached by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    None,
    Email,
    Phone,
    Identity,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationLevel::None => "none",
            VerificationLevel::Email => "email",
            VerificationLevel::Phone => "phone",
            VerificationLevel::Identity => "identity",
        }
    }
}

impl std::str::FromStr for VerificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerificationLevel::None),
            "email" => Ok(VerificationLevel::Email),
            "phone" => Ok(VerificationLevel::Phone),
            "identity" => Ok(VerificationLevel::Identity),
            _ => Err(format!("unknown verification level: {}", s)),
        }
    }
}

/// A registered player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub status: PlayerStatus,
    pub verification_level: VerificationLevel,
    /// Registration time
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// One authenticated login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Login {
    pub player_id: PlayerId,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Games
// ============================================

/// A period of play in one game type. Completed once `ended_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub player_id: PlayerId,
    pub game_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Outcome tag of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    Win,
    Loss,
    Draw,
}

impl RoundResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundResult::Win => "win",
            RoundResult::Loss => "loss",
            RoundResult::Draw => "draw",
        }
    }
}

/// One bet within a game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRound {
    pub session_id: i64,
    pub bet_amount: f64,
    pub win_amount: f64,
    pub result: RoundResult,
    pub played_at: DateTime<Utc>,
}

// ============================================
// Ledger
// ============================================

/// Ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Bet,
    Purchase,
    Fee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Bet => "bet",
            TransactionType::Purchase => "purchase",
            TransactionType::Fee => "fee",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" | "withdraw" => Ok(TransactionType::Withdrawal),
            "bet" => Ok(TransactionType::Bet),
            "purchase" => Ok(TransactionType::Purchase),
            "fee" => Ok(TransactionType::Fee),
            _ => Err(format!("unknown transaction type: {}", s)),
        }
    }
}

/// Settlement state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Pending => "pending",
        }
    }
}

/// Append-only ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub player_id: PlayerId,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Value score weights
// ============================================

/// Weights applied to the five value sub-scores.
///
/// Risk is applied inverted (`100 - risk`), so a larger `risk_weight`
/// rewards safer players more.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_activity_weight")]
    pub activity_weight: f64,
    #[serde(default = "default_loyalty_weight")]
    pub loyalty_weight: f64,
    #[serde(default = "default_spending_weight")]
    pub spending_weight: f64,
    #[serde(default = "default_risk_weight")]
    pub risk_weight: f64,
    #[serde(default = "default_profitability_weight")]
    pub profitability_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            activity_weight: default_activity_weight(),
            loyalty_weight: default_loyalty_weight(),
            spending_weight: default_spending_weight(),
            risk_weight: default_risk_weight(),
            profitability_weight: default_profitability_weight(),
        }
    }
}

impl ScoreWeights {
    /// Sum of all five weights.
    pub fn total(&self) -> f64 {
        self.activity_weight
            + self.loyalty_weight
            + self.spending_weight
            + self.risk_weight
            + self.profitability_weight
    }

    /// All weights finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [
            self.activity_weight,
            self.loyalty_weight,
            self.spending_weight,
            self.risk_weight,
            self.profitability_weight,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}

fn default_activity_weight() -> f64 {
    0.25
}

fn default_loyalty_weight() -> f64 {
    0.20
}

fn default_spending_weight() -> f64 {
    0.25
}

fn default_risk_weight() -> f64 {
    0.10
}

fn default_profitability_weight() -> f64 {
    0.20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!(weights.is_valid());
    }

    #[test]
    fn test_partial_weights_fill_defaults() {
        let weights: ScoreWeights = serde_json::from_str(r#"{"activity_weight": 1.0}"#).unwrap();
        assert_eq!(weights.activity_weight, 1.0);
        assert_eq!(weights.loyalty_weight, 0.20);
    }

    #[test]
    fn test_transaction_type_accepts_legacy_withdraw() {
        assert_eq!(
            "withdraw".parse::<TransactionType>().unwrap(),
            TransactionType::Withdrawal
        );
        assert!("refund".parse::<TransactionType>().is_err());
    }
}
