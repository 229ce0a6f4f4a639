use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    ranking::{rank_entries, RankedEntry},
    repo_types::LeaderboardEntry,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    hunts::repo_types::Hunt,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub hunt_id: i64,
    pub entries: Vec<RankedEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hunts/:id/leaderboard", get(hunt_leaderboard))
        .route("/hunts/:id/entries", post(start_entry))
        .route("/hunts/:id/entries/attempt", post(record_attempt))
        .route("/hunts/:id/entries/complete", post(complete_entry))
}

/// Loads the hunt and refuses to go on once it has expired.
async fn open_hunt(state: &AppState, hunt_id: i64, now: OffsetDateTime) -> AppResult<Hunt> {
    let hunt = Hunt::get(&state.db, hunt_id).await?;
    if hunt.is_expired(now) {
        warn!(hunt_id, "hunt expired");
        return Err(AppError::conflict("Hunt has expired"));
    }
    Ok(hunt)
}

async fn own_entry(state: &AppState, user_id: i64, hunt_id: i64) -> AppResult<LeaderboardEntry> {
    LeaderboardEntry::find(&state.db, user_id, hunt_id)
        .await?
        .ok_or(AppError::NotFound("Leaderboard entry"))
}

#[instrument(skip(state))]
pub async fn start_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(hunt_id): Path<i64>,
) -> AppResult<(StatusCode, Json<LeaderboardEntry>)> {
    let now = OffsetDateTime::now_utc();
    open_hunt(&state, hunt_id, now).await?;

    let (entry, created) = LeaderboardEntry::start(&state.db, user_id, hunt_id, now).await?;
    if created {
        info!(entry_id = entry.id, user_id, hunt_id, "hunt started");
        Ok((StatusCode::CREATED, Json(entry)))
    } else {
        Ok((StatusCode::OK, Json(entry)))
    }
}

#[instrument(skip(state))]
pub async fn record_attempt(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(hunt_id): Path<i64>,
) -> AppResult<Json<LeaderboardEntry>> {
    open_hunt(&state, hunt_id, OffsetDateTime::now_utc()).await?;
    let entry = own_entry(&state, user_id, hunt_id).await?;
    let entry = LeaderboardEntry::record_attempt(&state.db, entry.id).await?;
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn complete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(hunt_id): Path<i64>,
) -> AppResult<Json<LeaderboardEntry>> {
    let now = OffsetDateTime::now_utc();
    open_hunt(&state, hunt_id, now).await?;
    let entry = own_entry(&state, user_id, hunt_id).await?;
    let entry = entry.complete(&state.db, now).await?;
    info!(
        entry_id = entry.id,
        user_id,
        hunt_id,
        attempts = entry.attempts,
        "hunt completed"
    );
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn hunt_leaderboard(
    State(state): State<AppState>,
    Path(hunt_id): Path<i64>,
) -> AppResult<Json<LeaderboardResponse>> {
    let hunt = Hunt::get(&state.db, hunt_id).await?;
    let entries = LeaderboardEntry::list_by_hunt(&state.db, hunt.id).await?;
    Ok(Json(LeaderboardResponse {
        hunt_id: hunt.id,
        entries: rank_entries(entries),
    }))
}
