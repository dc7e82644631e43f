use std::path::PathBuf;

use anyhow::Context;

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Postgres is used when set (and the `postgres-store` feature is on).
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Snapshot directory for the in-memory store.
    pub data_dir: Option<PathBuf>,
    pub seed_sample_questions: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |name: &str| get(name).filter(|v| !v.trim().is_empty());
        fn parsed<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match raw {
                Some(v) => v.trim().parse().with_context(|| format!("{name} has an invalid value '{v}'")),
                None => Ok(default),
            }
        }
        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", non_empty("PORT"), 3000)?,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", non_empty("DB_MAX_CONNECTIONS"), 5)?,
            data_dir: non_empty("QUIZ_DATA_DIR").map(PathBuf::from),
            seed_sample_questions: non_empty("SEED_SAMPLE_QUESTIONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
