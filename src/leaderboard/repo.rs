use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::repo_types::LeaderboardEntry;
use crate::error::{AppError, AppResult};

impl LeaderboardEntry {
    pub async fn find(db: &SqlitePool, user_id: i64, hunt_id: i64) -> AppResult<Option<Self>> {
        let entry = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT id, user_id, hunt_id, time_started, time_completed, attempts
            FROM leaderboard_entries
            WHERE user_id = ?1 AND hunt_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(hunt_id)
        .fetch_optional(db)
        .await?;
        Ok(entry)
    }

    /// Opens the user's entry for a hunt. Returns the existing entry (and
    /// `false`) if the user already started.
    pub async fn start(
        db: &SqlitePool,
        user_id: i64,
        hunt_id: i64,
        now: OffsetDateTime,
    ) -> AppResult<(Self, bool)> {
        let inserted = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            INSERT INTO leaderboard_entries (user_id, hunt_id, time_started, attempts)
            VALUES (?1, ?2, ?3, 0)
            ON CONFLICT (user_id, hunt_id) DO NOTHING
            RETURNING id, user_id, hunt_id, time_started, time_completed, attempts
            "#,
        )
        .bind(user_id)
        .bind(hunt_id)
        .bind(now)
        .fetch_optional(db)
        .await?;

        if let Some(entry) = inserted {
            return Ok((entry, true));
        }
        let existing = Self::find(db, user_id, hunt_id)
            .await?
            .ok_or(AppError::NotFound("Leaderboard entry"))?;
        Ok((existing, false))
    }

    /// Counts one more attempt on an entry that is still open.
    pub async fn record_attempt(db: &SqlitePool, id: i64) -> AppResult<Self> {
        sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            UPDATE leaderboard_entries
               SET attempts = attempts + 1
             WHERE id = ?1 AND time_completed IS NULL
            RETURNING id, user_id, hunt_id, time_started, time_completed, attempts
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::conflict("Entry already completed"))
    }

    /// Marks the entry finished at `at`, which may not precede the start.
    pub async fn complete(&self, db: &SqlitePool, at: OffsetDateTime) -> AppResult<Self> {
        if self.is_completed() {
            return Err(AppError::conflict("Entry already completed"));
        }
        if at < self.time_started {
            return Err(AppError::validation("Completion cannot precede start"));
        }

        sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            UPDATE leaderboard_entries
               SET time_completed = ?2
             WHERE id = ?1 AND time_completed IS NULL
            RETURNING id, user_id, hunt_id, time_started, time_completed, attempts
            "#,
        )
        .bind(self.id)
        .bind(at)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::conflict("Entry already completed"))
    }

    pub async fn list_by_hunt(db: &SqlitePool, hunt_id: i64) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT id, user_id, hunt_id, time_started, time_completed, attempts
            FROM leaderboard_entries
            WHERE hunt_id = ?1
            "#,
        )
        .bind(hunt_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::{Role, User};
    use crate::db;
    use crate::hunts::repo_types::{Hunt, NewClue, NewHunt, ValidationMethod};
    use time::Duration;

    async fn seed(db: &SqlitePool) -> (User, Hunt) {
        let user = User::create(db, "runner@example.com", "hash", Role::Player)
            .await
            .unwrap();
        let now = OffsetDateTime::now_utc();
        let (hunt, _) = Hunt::create_with_clues(
            db,
            NewHunt {
                creator_id: user.id,
                title: "Park".into(),
                theme: "nature".into(),
                validation_method: ValidationMethod::Text,
                created_at: now,
                expires_at: now + Duration::days(1),
            },
            vec![NewClue {
                clue_number: 1,
                clue_text: Some("Oldest oak".into()),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
        (user, hunt)
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let now = OffsetDateTime::now_utc();

        let (first, created) = LeaderboardEntry::start(&pool, user.id, hunt.id, now).await.unwrap();
        assert!(created);
        assert_eq!(first.attempts, 0);
        assert!(first.time_completed.is_none());

        let later = now + Duration::minutes(5);
        let (again, created) = LeaderboardEntry::start(&pool, user.id, hunt.id, later).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(again.time_started, first.time_started);
    }

    #[tokio::test]
    async fn unknown_user_or_hunt_is_rejected() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let now = OffsetDateTime::now_utc();

        let err = LeaderboardEntry::start(&pool, user.id + 50, hunt.id, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

        let err = LeaderboardEntry::start(&pool, user.id, hunt.id + 50, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn attempts_then_completion() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let start = OffsetDateTime::now_utc();
        let (entry, _) = LeaderboardEntry::start(&pool, user.id, hunt.id, start).await.unwrap();

        LeaderboardEntry::record_attempt(&pool, entry.id).await.unwrap();
        let entry = LeaderboardEntry::record_attempt(&pool, entry.id).await.unwrap();
        assert_eq!(entry.attempts, 2);

        let done = entry.complete(&pool, start + Duration::minutes(12)).await.unwrap();
        assert_eq!(done.elapsed(), Some(Duration::minutes(12)));

        let err = LeaderboardEntry::record_attempt(&pool, done.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = done.complete(&pool, start + Duration::hours(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn completion_before_start_is_rejected() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let start = OffsetDateTime::now_utc();
        let (entry, _) = LeaderboardEntry::start(&pool, user.id, hunt.id, start).await.unwrap();

        let err = entry.complete(&pool, start - Duration::seconds(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let stored = LeaderboardEntry::find(&pool, user.id, hunt.id).await.unwrap().unwrap();
        assert!(stored.time_completed.is_none());
    }

    #[tokio::test]
    async fn schema_rejects_completion_before_start_and_negative_attempts() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let start = OffsetDateTime::now_utc();

        let err = sqlx::query(
            "INSERT INTO leaderboard_entries (user_id, hunt_id, time_started, time_completed, attempts)
             VALUES (?1, ?2, ?3, ?4, 0)",
        )
        .bind(user.id)
        .bind(hunt.id)
        .bind(start)
        .bind(start - Duration::minutes(1))
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Validation(_)));

        let err = sqlx::query(
            "INSERT INTO leaderboard_entries (user_id, hunt_id, time_started, attempts)
             VALUES (?1, ?2, ?3, -1)",
        )
        .bind(user.id)
        .bind(hunt.id)
        .bind(start)
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_by_hunt_returns_every_runner() {
        let pool = db::memory_pool().await;
        let (user, hunt) = seed(&pool).await;
        let other = User::create(&pool, "second@example.com", "hash", Role::Player)
            .await
            .unwrap();
        let now = OffsetDateTime::now_utc();
        LeaderboardEntry::start(&pool, user.id, hunt.id, now).await.unwrap();
        LeaderboardEntry::start(&pool, other.id, hunt.id, now).await.unwrap();

        assert_eq!(LeaderboardEntry::list_by_hunt(&pool, hunt.id).await.unwrap().len(), 2);
    }
}
