//! Read-side reporting routes over the archive.

use axum::extract::{Path, Query, State};
use axum::{Json, Router, routing::get};
use quizwire_core::archive::{GameDetails, GameSummary, PlayerTotals};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Listing size parameter shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    /// Maximum rows to return.
    limit: Option<i64>,
}

impl LimitParams {
    fn clamped(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, 100)
    }
}

/// GET /recent-games?limit=
async fn recent_games(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let games = state.archive.recent_games(params.clamped(20)).await?;
    Ok(Json(games))
}

/// GET /games/{id}
async fn game_details(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameDetails>, ApiError> {
    let details = state.archive.game_details(game_id).await?;
    Ok(Json(details))
}

/// GET /top-players?limit=
async fn top_players(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<PlayerTotals>>, ApiError> {
    let players = state.archive.top_players(params.clamped(10)).await?;
    Ok(Json(players))
}

/// Returns the router for the reporting endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent-games", get(recent_games))
        .route("/games/{id}", get(game_details))
        .route("/top-players", get(top_players))
}
