use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Clue, Coordinates, Hunt, NewClue, ValidationMethod};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ClueInput {
    pub clue_number: i64,
    pub photo_path: Option<String>,
    pub clue_text: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl From<ClueInput> for NewClue {
    fn from(c: ClueInput) -> Self {
        Self {
            clue_number: c.clue_number,
            photo_path: c.photo_path,
            clue_text: c.clue_text,
            coordinates: c.coordinates,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHuntRequest {
    pub title: String,
    pub theme: String,
    pub validation_method: ValidationMethod,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub clues: Vec<ClueInput>,
}

#[derive(Debug, Serialize)]
pub struct ClueView {
    pub id: i64,
    pub hunt_id: i64,
    pub clue_number: i64,
    pub photo_path: Option<String>,
    pub clue_text: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl From<Clue> for ClueView {
    fn from(c: Clue) -> Self {
        let coordinates = c.coordinates();
        Self {
            id: c.id,
            hunt_id: c.hunt_id,
            clue_number: c.clue_number,
            photo_path: c.photo_path,
            clue_text: c.clue_text,
            coordinates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HuntDetails {
    #[serde(flatten)]
    pub hunt: Hunt,
    pub clues: Vec<ClueView>,
}

impl HuntDetails {
    pub fn new(hunt: Hunt, clues: Vec<Clue>) -> Self {
        Self {
            hunt,
            clues: clues.into_iter().map(ClueView::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Pagination {
    /// Clamp to sane bounds instead of rejecting odd query strings.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_LIMIT), self.offset.max(0))
    }
}
