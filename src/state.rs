use crate::config::AppConfig;
use crate::db;
use crate::templates::Templates;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything a handler may touch. Built once at startup and handed to the
/// router; nothing is reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = db::connect(&config.database_url).await?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: SqlitePool, config: AppConfig) -> Self {
        let templates = Arc::new(Templates::new(&config.template_dir));
        Self {
            db,
            config: Arc::new(config),
            templates,
        }
    }

    #[cfg(test)]
    pub async fn for_tests(template_dir: &std::path::Path) -> Self {
        let dir = template_dir.to_string_lossy().into_owned();
        let config = AppConfig::from_lookup(|key| match key {
            "SECRET_KEY" => Some("test-secret".into()),
            "JWT_SECRET_KEY" => Some("test-jwt-secret".into()),
            "JWT_ISSUER" => Some("test-issuer".into()),
            "JWT_AUDIENCE" => Some("test-aud".into()),
            "DATABASE_URL" => Some("sqlite::memory:".into()),
            "TEMPLATE_DIR" => Some(dir.clone()),
            _ => None,
        });
        Self::from_parts(db::memory_pool().await, config)
    }
}
