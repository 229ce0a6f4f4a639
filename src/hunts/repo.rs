use sqlx::{Executor, Sqlite, SqlitePool};
use time::OffsetDateTime;

use super::repo_types::{validate_clue_set, Clue, Hunt, NewClue, NewHunt};
use crate::error::{AppError, AppResult};

impl Hunt {
    /// Insert a hunt together with its clues in one transaction.
    pub async fn create_with_clues(
        db: &SqlitePool,
        hunt: NewHunt,
        clues: Vec<NewClue>,
    ) -> AppResult<(Hunt, Vec<Clue>)> {
        hunt.validate()?;
        validate_clue_set(&clues)?;

        let mut tx = db.begin().await?;
        let created = sqlx::query_as::<_, Hunt>(
            r#"
            INSERT INTO hunts (creator_id, title, theme, validation_method, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, creator_id, title, theme, validation_method, created_at, expires_at
            "#,
        )
        .bind(hunt.creator_id)
        .bind(hunt.title.trim())
        .bind(hunt.theme.trim())
        .bind(hunt.validation_method)
        .bind(hunt.created_at)
        .bind(hunt.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut inserted = Vec::with_capacity(clues.len());
        for clue in &clues {
            inserted.push(Clue::insert(&mut *tx, created.id, clue).await?);
        }
        tx.commit().await?;

        inserted.sort_by_key(|c| c.clue_number);
        Ok((created, inserted))
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> AppResult<Option<Hunt>> {
        let hunt = sqlx::query_as::<_, Hunt>(
            r#"
            SELECT id, creator_id, title, theme, validation_method, created_at, expires_at
            FROM hunts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(hunt)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> AppResult<Hunt> {
        Self::find_by_id(db, id).await?.ok_or(AppError::NotFound("Hunt"))
    }

    /// Hunts that have not expired at `now`, newest first.
    pub async fn list_active(
        db: &SqlitePool,
        now: OffsetDateTime,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Hunt>> {
        let rows = sqlx::query_as::<_, Hunt>(
            r#"
            SELECT id, creator_id, title, theme, validation_method, created_at, expires_at
            FROM hunts
            WHERE julianday(expires_at) > julianday(?1)
            ORDER BY julianday(created_at) DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(now)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

impl Clue {
    pub async fn insert<'e, E>(executor: E, hunt_id: i64, clue: &NewClue) -> AppResult<Clue>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        clue.validate()?;
        let clue = sqlx::query_as::<_, Clue>(
            r#"
            INSERT INTO clues (hunt_id, clue_number, photo_path, clue_text, gps_lat, gps_lon)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, hunt_id, clue_number, photo_path, clue_text, gps_lat, gps_lon
            "#,
        )
        .bind(hunt_id)
        .bind(clue.clue_number)
        .bind(clue.photo_path.as_deref())
        .bind(clue.clue_text.as_deref())
        .bind(clue.coordinates.map(|c| c.lat))
        .bind(clue.coordinates.map(|c| c.lon))
        .fetch_one(executor)
        .await?;
        Ok(clue)
    }

    pub async fn list_by_hunt(db: &SqlitePool, hunt_id: i64) -> AppResult<Vec<Clue>> {
        let rows = sqlx::query_as::<_, Clue>(
            r#"
            SELECT id, hunt_id, clue_number, photo_path, clue_text, gps_lat, gps_lon
            FROM clues
            WHERE hunt_id = ?1
            ORDER BY clue_number ASC
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
    use crate::hunts::repo_types::{Coordinates, ValidationMethod};
    use time::Duration;

    async fn creator(db: &SqlitePool) -> User {
        User::create(db, "maker@example.com", "hash", Role::Creator)
            .await
            .unwrap()
    }

    fn new_hunt(creator_id: i64, title: &str, created_at: OffsetDateTime, ttl: Duration) -> NewHunt {
        NewHunt {
            creator_id,
            title: title.into(),
            theme: "city".into(),
            validation_method: ValidationMethod::Photo,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    fn clue(n: i64) -> NewClue {
        NewClue {
            clue_number: n,
            clue_text: Some(format!("clue {n}")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_hunt_with_clues_roundtrip() {
        let pool = db::memory_pool().await;
        let user = creator(&pool).await;
        let now = OffsetDateTime::now_utc();

        let located = NewClue {
            clue_number: 1,
            photo_path: Some("photos/fountain.jpg".into()),
            coordinates: Some(Coordinates { lat: 52.52, lon: 13.405 }),
            ..Default::default()
        };
        let (hunt, clues) = Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Berlin", now, Duration::days(1)),
            vec![clue(2), located],
        )
        .await
        .unwrap();

        assert_eq!(hunt.creator_id, user.id);
        assert!(hunt.expires_at > hunt.created_at);
        assert_eq!(clues.iter().map(|c| c.clue_number).collect::<Vec<_>>(), vec![1, 2]);

        let stored = Hunt::get(&pool, hunt.id).await.unwrap();
        assert_eq!(stored.title, "Berlin");
        assert_eq!(stored.validation_method, ValidationMethod::Photo);
        assert_eq!(stored.expires_at, hunt.expires_at);

        let listed = Clue::list_by_hunt(&pool, hunt.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].coordinates(), Some(Coordinates { lat: 52.52, lon: 13.405 }));
        assert_eq!(listed[1].coordinates(), None);
    }

    #[tokio::test]
    async fn unknown_creator_is_rejected() {
        let pool = db::memory_pool().await;
        let err = Hunt::create_with_clues(
            &pool,
            new_hunt(4242, "Ghost", OffsetDateTime::now_utc(), Duration::hours(2)),
            vec![clue(1)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hunts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn expiration_before_creation_is_rejected() {
        let pool = db::memory_pool().await;
        let user = creator(&pool).await;
        let err = Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Backwards", OffsetDateTime::now_utc(), Duration::hours(-1)),
            vec![clue(1)],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn schema_rejects_expiration_before_creation() {
        let pool = db::memory_pool().await;
        let user = creator(&pool).await;
        let now = OffsetDateTime::now_utc();
        let err = sqlx::query(
            "INSERT INTO hunts (creator_id, title, theme, validation_method, created_at, expires_at)
             VALUES (?1, 't', 't', 'text', ?2, ?3)",
        )
        .bind(user.id)
        .bind(now)
        .bind(now - Duration::minutes(5))
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn clue_numbers_are_unique_per_hunt() {
        let pool = db::memory_pool().await;
        let user = creator(&pool).await;
        let now = OffsetDateTime::now_utc();
        let (first, _) = Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "First", now, Duration::days(1)),
            vec![clue(1)],
        )
        .await
        .unwrap();
        let (second, _) = Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Second", now, Duration::days(1)),
            vec![clue(1)],
        )
        .await
        .unwrap();

        let err = Clue::insert(&pool, first.id, &clue(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

        Clue::insert(&pool, second.id, &clue(2)).await.unwrap();
        assert_eq!(Clue::list_by_hunt(&pool, second.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clue_for_unknown_hunt_is_rejected() {
        let pool = db::memory_pool().await;
        let err = Clue::insert(&pool, 77, &clue(1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn list_active_skips_expired_hunts() {
        let pool = db::memory_pool().await;
        let user = creator(&pool).await;
        let now = OffsetDateTime::now_utc();

        Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Old", now - Duration::days(3), Duration::days(1)),
            vec![clue(1)],
        )
        .await
        .unwrap();
        Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Earlier", now - Duration::hours(2), Duration::days(1)),
            vec![clue(1)],
        )
        .await
        .unwrap();
        Hunt::create_with_clues(
            &pool,
            new_hunt(user.id, "Latest", now, Duration::days(1)),
            vec![clue(1)],
        )
        .await
        .unwrap();

        let active = Hunt::list_active(&pool, now, 20, 0).await.unwrap();
        let titles: Vec<_> = active.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Latest", "Earlier"]);

        let page = Hunt::list_active(&pool, now, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Earlier");
    }
}
