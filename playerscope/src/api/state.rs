use playerscope_core::analytics::{
    GamePreferenceAnalyzer, PlayerStore, SpendingHabitsAnalyzer, ValueScoreAnalyzer,
};
use playerscope_core::config::AnalyticsConfig;
use std::sync::Arc;
use std::time::Instant;

/// Shared state for all handlers
pub struct AppState {
    // Analyzers share one store; each clone is cheap
    pub game_preference: GamePreferenceAnalyzer,
    pub spending_habits: SpendingHabitsAnalyzer,
    pub value_score: ValueScoreAnalyzer,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn PlayerStore>, config: &AnalyticsConfig) -> Arc<Self> {
        Arc::new(Self {
            game_preference: GamePreferenceAnalyzer::new(store.clone(), config.clone()),
            spending_habits: SpendingHabitsAnalyzer::new(store.clone(), config.clone()),
            value_score: ValueScoreAnalyzer::new(store, config.clone()),
            started_at: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
