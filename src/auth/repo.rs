use sqlx::SqlitePool;

use crate::auth::repo_types::{Role, User};
use crate::error::{AppError, AppResult};

const CREDIT_UPDATE_RETRIES: usize = 3;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, credits
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, credits
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. A taken email surfaces as
    /// `AppError::Conflict`.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role, credits)
            VALUES (?1, ?2, ?3, 0)
            RETURNING id, email, password_hash, role, credits
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Add `delta` (possibly negative) to the credit balance. The balance never
    /// drops below zero and never leaves the i64 range.
    pub async fn adjust_credits(db: &SqlitePool, id: i64, delta: i64) -> AppResult<User> {
        for _ in 0..CREDIT_UPDATE_RETRIES {
            let current = Self::find_by_id(db, id)
                .await?
                .ok_or(AppError::NotFound("User"))?;
            let balance = current
                .credits
                .checked_add(delta)
                .filter(|balance| *balance >= 0)
                .ok_or_else(|| AppError::validation("Credit balance out of range"))?;

            // Compare-and-set against the balance read above.
            let updated = sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                   SET credits = ?2
                 WHERE id = ?1 AND credits = ?3
                RETURNING id, email, password_hash, role, credits
                "#,
            )
            .bind(id)
            .bind(balance)
            .bind(current.credits)
            .fetch_optional(db)
            .await?;

            if let Some(user) = updated {
                return Ok(user);
            }
        }
        Err(AppError::conflict("Credit balance changed concurrently, retry"))
    }
}
