use tracing::warn;

pub const DEFAULT_SECRET_KEY: &str = "YOUR_SECRET_KEY";
pub const DEFAULT_JWT_SECRET_KEY: &str = "YOUR_JWT_SECRET_KEY";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://treasure.db";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Application secret, mixed into every password hash.
    pub secret_key: String,
    pub jwt: JwtConfig,
    pub template_dir: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        if config.uses_fallback_secrets() {
            config.warn_on_fallback_secrets();
        }
        Ok(config)
    }

    /// Resolves every setting through `lookup`, falling back to the built-in
    /// defaults. Values are taken as-is; nothing is validated here.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_minutes = |key: &str, default: i64| {
            lookup(key)
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(default)
        };

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET_KEY").unwrap_or_else(|| DEFAULT_JWT_SECRET_KEY.into()),
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "treasure".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "treasure-users".into()),
            ttl_minutes: parse_minutes("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parse_minutes("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            secret_key: lookup("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.into()),
            jwt,
            template_dir: lookup("TEMPLATE_DIR").unwrap_or_else(|| "templates".into()),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: lookup("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        }
    }

    pub fn uses_fallback_secrets(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY || self.jwt.secret == DEFAULT_JWT_SECRET_KEY
    }

    fn warn_on_fallback_secrets(&self) {
        if self.secret_key == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY not set; using the insecure built-in default");
        }
        if self.jwt.secret == DEFAULT_JWT_SECRET_KEY {
            warn!("JWT_SECRET_KEY not set; using the insecure built-in default");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_fallbacks() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg.secret_key, DEFAULT_SECRET_KEY);
        assert_eq!(cfg.jwt.secret, DEFAULT_JWT_SECRET_KEY);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.jwt.refresh_ttl_minutes, 60 * 24 * 14);
        assert_eq!(cfg.port, 8080);
        assert!(cfg.uses_fallback_secrets());
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SECRET_KEY", "s3cret"),
            ("JWT_SECRET_KEY", "jwt-s3cret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_TTL_MINUTES", "5"),
            ("APP_PORT", "9000"),
        ]));
        assert_eq!(cfg.secret_key, "s3cret");
        assert_eq!(cfg.jwt.secret, "jwt-s3cret");
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.jwt.ttl_minutes, 5);
        assert_eq!(cfg.port, 9000);
        assert!(!cfg.uses_fallback_secrets());
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_TTL_MINUTES", "soon"),
            ("APP_PORT", "eighty"),
        ]));
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.port, 8080);
    }
}
