use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use playerscope_core::analytics::{
    GamePreferenceAnalysis, GamePreferenceRequest, SpendingHabitsAnalysis, ValueScoreAnalysis,
    ValueScoreRequest,
};
use playerscope_core::types::PlayerId;
use serde::Serialize;
use std::sync::Arc;

use super::envelope::Envelope;
use super::error::ApiError;
use super::state::AppState;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Positive integer ids only; anything else never reaches the store.
fn parse_player_id(raw: &str) -> Result<PlayerId, ApiError> {
    match raw.parse::<PlayerId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::InvalidPlayerId(raw.to_string())),
    }
}

/// Run a synchronous analysis off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> playerscope_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Analysis(format!("analysis task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// POST /players/{id}/game-preference
pub async fn game_preference(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<GamePreferenceAnalysis> {
    let player_id = parse_player_id(&raw_id)?;
    let request: GamePreferenceRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let analyzer = state.game_preference.clone();
    let analysis = run_blocking(move || analyzer.analyze(player_id, &request)).await?;

    Ok(Envelope::ok("Game preference analysis completed", analysis))
}

/// POST /players/{id}/spending-habits
///
/// Windows are fixed, so any body is ignored.
pub async fn spending_habits(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<SpendingHabitsAnalysis> {
    let player_id = parse_player_id(&raw_id)?;

    let analyzer = state.spending_habits.clone();
    let analysis = run_blocking(move || analyzer.analyze(player_id)).await?;

    Ok(Envelope::ok("Spending habits analysis completed", analysis))
}

/// POST /players/{id}/value-score
///
/// An unreadable body falls back to the default request rather than failing.
pub async fn value_score(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<ValueScoreAnalysis> {
    let player_id = parse_player_id(&raw_id)?;
    let request = ValueScoreRequest::from_json_lenient(&body);

    let analyzer = state.value_score.clone();
    let analysis = run_blocking(move || analyzer.analyze(player_id, &request)).await?;

    Ok(Envelope::ok("Player value score computed", analysis))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// GET /health - Liveness probe
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Envelope<HealthResponse>> {
    Envelope::ok(
        "ok",
        HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.uptime_secs(),
        },
    )
}
