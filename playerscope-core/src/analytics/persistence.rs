//! Analysis history write-back
//!
//! Each completed analysis is appended to its history table as an opaque JSON
//! snapshot. Writes are best-effort: a failure is logged and swallowed so the
//! caller's response is never affected.

use super::store::PlayerStore;
use crate::types::PlayerId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which history table a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    GamePreference,
    SpendingHabits,
    ValueScore,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::GamePreference => "game_preference",
            AnalysisKind::SpendingHabits => "spending_habits",
            AnalysisKind::ValueScore => "value_score",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            AnalysisKind::GamePreference => "game_preference_analyses",
            AnalysisKind::SpendingHabits => "spending_habits_analyses",
            AnalysisKind::ValueScore => "value_score_analyses",
        }
    }
}

/// One row to append to a history table.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub kind: AnalysisKind,
    pub player_id: PlayerId,
    /// `7d`..`365d`, or `fixed` for the spending analysis' internal windows
    pub time_range: String,
    /// Favorite game type, spending level or value category
    pub label: Option<String>,
    /// Overall score (value score only)
    pub score: Option<f64>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Serialize `analysis` into a record of the given kind.
    pub fn from_analysis<T: Serialize>(
        kind: AnalysisKind,
        player_id: PlayerId,
        time_range: &str,
        analysis: &T,
        created_at: DateTime<Utc>,
    ) -> crate::Result<Self> {
        Ok(Self {
            kind,
            player_id,
            time_range: time_range.to_string(),
            label: None,
            score: None,
            data: serde_json::to_value(analysis)?,
            created_at,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Append `record` to history, logging instead of failing.
///
/// Returns the new row id when the write succeeded.
pub fn persist_best_effort(store: &dyn PlayerStore, record: &AnalysisRecord) -> Option<i64> {
    match store.save_analysis(record) {
        Ok(id) => {
            tracing::debug!(
                kind = record.kind.as_str(),
                player_id = record.player_id,
                row_id = id,
                "Analysis persisted"
            );
            Some(id)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                kind = record.kind.as_str(),
                player_id = record.player_id,
                "Failed to persist analysis"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = AnalysisRecord::from_analysis(
            AnalysisKind::ValueScore,
            3,
            "90d",
            &serde_json::json!({"overall_score": 61.5}),
            Utc::now(),
        )
        .unwrap()
        .with_label("High")
        .with_score(61.5);

        assert_eq!(record.kind.table(), "value_score_analyses");
        assert_eq!(record.label.as_deref(), Some("High"));
        assert_eq!(record.score, Some(61.5));
        assert_eq!(record.data["overall_score"], 61.5);
    }
}
