//! Player analytics
//!
//! Three analyzers read aggregates through [`PlayerStore`] and compose them
//! into reports:
//! - [`GamePreferenceAnalyzer`]: what, when and how a player plays
//! - [`SpendingHabitsAnalyzer`]: frequency, amounts, timing, channels, risk and capacity
//! - [`ValueScoreAnalyzer`]: weighted value score with retention and potential
//!
//! Scoring is pure and lives in [`scoring`]. Results are optionally appended
//! to history tables; a failed write never fails the analysis.

pub mod game_preference;
pub mod persistence;
pub mod scoring;
pub mod spending_habits;
pub mod store;
pub mod value_score;
pub mod window;

pub use game_preference::{GamePreferenceAnalysis, GamePreferenceAnalyzer, GamePreferenceRequest};
pub use persistence::{AnalysisKind, AnalysisRecord};
pub use spending_habits::{SpendingHabitsAnalysis, SpendingHabitsAnalyzer};
pub use store::PlayerStore;
pub use value_score::{ValueScoreAnalysis, ValueScoreAnalyzer, ValueScoreRequest};
pub use window::{AnalysisWindow, TimeRange};
