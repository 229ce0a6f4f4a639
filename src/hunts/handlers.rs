use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{ClueInput, ClueView, CreateHuntRequest, HuntDetails, Pagination},
    repo_types::{Clue, Hunt, NewClue, NewHunt},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/hunts", get(list_hunts))
        .route("/hunts/:id", get(get_hunt))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/hunts", post(create_hunt))
        .route("/hunts/:id/clues", post(add_clue))
}

#[instrument(skip(state, body))]
pub async fn create_hunt(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateHuntRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<HuntDetails>)> {
    let new_hunt = NewHunt {
        creator_id: user_id,
        title: body.title,
        theme: body.theme,
        validation_method: body.validation_method,
        created_at: OffsetDateTime::now_utc(),
        expires_at: body.expires_at,
    };
    let clues: Vec<NewClue> = body.clues.into_iter().map(NewClue::from).collect();

    let (hunt, clues) = Hunt::create_with_clues(&state.db, new_hunt, clues)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id, "create hunt rejected");
            e
        })?;

    info!(hunt_id = hunt.id, user_id, clues = clues.len(), "hunt created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/hunts/{}", hunt.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(HuntDetails::new(hunt, clues))))
}

#[instrument(skip(state))]
pub async fn list_hunts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<Hunt>>> {
    let (limit, offset) = p.clamped();
    let hunts = Hunt::list_active(&state.db, OffsetDateTime::now_utc(), limit, offset).await?;
    Ok(Json(hunts))
}

#[instrument(skip(state))]
pub async fn get_hunt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<HuntDetails>> {
    let hunt = Hunt::get(&state.db, id).await?;
    let clues = Clue::list_by_hunt(&state.db, id).await?;
    Ok(Json(HuntDetails::new(hunt, clues)))
}

/// Only the hunt's creator may append clues.
#[instrument(skip(state, body))]
pub async fn add_clue(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(hunt_id): Path<i64>,
    Json(body): Json<ClueInput>,
) -> AppResult<(StatusCode, Json<ClueView>)> {
    let hunt = Hunt::get(&state.db, hunt_id).await?;
    if hunt.creator_id != user_id {
        warn!(hunt_id, user_id, "clue added by non-creator");
        return Err(AppError::Forbidden);
    }

    let clue = Clue::insert(&state.db, hunt_id, &NewClue::from(body)).await?;
    info!(hunt_id, clue_id = clue.id, clue_number = clue.clue_number, "clue added");
    Ok((StatusCode::CREATED, Json(clue.into())))
}
