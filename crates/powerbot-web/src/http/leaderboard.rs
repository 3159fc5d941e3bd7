use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use powerbot_economy::LeaderboardEntry;

use crate::app::AppState;

const LEADERBOARD_SIZE: i64 = 10;

/// GET /api/economy/top10 (§6). Runs the read on a blocking thread since
/// `rusqlite::Connection` is synchronous and must not stall the HTTP
/// runtime (§5).
pub async fn top10_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, StatusCode> {
    tokio::task::spawn_blocking(move || {
        let conn = state.db.lock().expect("economy db mutex poisoned");
        powerbot_economy::top_leaderboard(&conn, LEADERBOARD_SIZE)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "leaderboard blocking task panicked");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map(Json)
    .map_err(|e| {
        error!(error = %e, "leaderboard query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
