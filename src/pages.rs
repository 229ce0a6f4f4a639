use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{error::AppResult, hunts::repo_types::Hunt, state::AppState};

const HOME_TEMPLATE: &str = "index.html";
const HOME_HUNT_COUNT: i64 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
}

#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let hunts = Hunt::list_active(&state.db, OffsetDateTime::now_utc(), HOME_HUNT_COUNT, 0).await?;
    let html = state
        .templates
        .render(
            HOME_TEMPLATE,
            &json!({
                "title": "Treasure Hunt",
                "active_hunts": hunts,
            }),
        )
        .await?;
    Ok(Html(html))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
