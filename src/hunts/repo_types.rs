use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_THEME_LEN: usize = 100;
pub const MAX_PHOTO_PATH_LEN: usize = 200;
pub const MAX_CLUE_TEXT_LEN: usize = 500;

/// How players are expected to prove they solved a clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ValidationMethod {
    Photo,
    Gps,
    Text,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Hunt {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub theme: String,
    pub validation_method: ValidationMethod,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Hunt {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Clue {
    pub id: i64,
    pub hunt_id: i64,
    pub clue_number: i64,
    pub photo_path: Option<String>,
    pub clue_text: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
}

impl Clue {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.gps_lat, self.gps_lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn validate(&self) -> AppResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::validation("Latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(AppError::validation("Longitude must be within [-180, 180]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewHunt {
    pub creator_id: i64,
    pub title: String,
    pub theme: String,
    pub validation_method: ValidationMethod,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl NewHunt {
    pub fn validate(&self) -> AppResult<()> {
        check_text("Title", &self.title, MAX_TITLE_LEN)?;
        check_text("Theme", &self.theme, MAX_THEME_LEN)?;
        if self.expires_at <= self.created_at {
            return Err(AppError::validation("Expiration must be after creation"));
        }
        Ok(())
    }
}

/// A clue waiting to be inserted. Photo, text and coordinates are each
/// optional, and an entirely empty clue is accepted.
#[derive(Debug, Clone, Default)]
pub struct NewClue {
    pub clue_number: i64,
    pub photo_path: Option<String>,
    pub clue_text: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl NewClue {
    pub fn validate(&self) -> AppResult<()> {
        if self.clue_number < 1 {
            return Err(AppError::validation("Clue number must be at least 1"));
        }
        if let Some(path) = &self.photo_path {
            if path.chars().count() > MAX_PHOTO_PATH_LEN {
                return Err(AppError::validation("Photo path too long"));
            }
        }
        if let Some(text) = &self.clue_text {
            if text.chars().count() > MAX_CLUE_TEXT_LEN {
                return Err(AppError::validation("Clue text too long"));
            }
        }
        if let Some(coords) = &self.coordinates {
            coords.validate()?;
        }
        Ok(())
    }
}

/// A new hunt needs at least one clue, and its clue numbers must be distinct.
pub fn validate_clue_set(clues: &[NewClue]) -> AppResult<()> {
    if clues.is_empty() {
        return Err(AppError::validation("A hunt needs at least one clue"));
    }
    let mut seen = HashSet::with_capacity(clues.len());
    for clue in clues {
        clue.validate()?;
        if !seen.insert(clue.clue_number) {
            return Err(AppError::validation(format!(
                "Duplicate clue number {}",
                clue.clue_number
            )));
        }
    }
    Ok(())
}

fn check_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::validation(format!("{field} too long")));
    }
    Ok(())
}
