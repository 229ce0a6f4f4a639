use serde::Serialize;
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};

/// One user's run at one hunt.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub user_id: i64,
    pub hunt_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub time_started: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub time_completed: Option<OffsetDateTime>,
    pub attempts: i64,
}

impl LeaderboardEntry {
    pub fn is_completed(&self) -> bool {
        self.time_completed.is_some()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.time_completed.map(|done| done - self.time_started)
    }
}
