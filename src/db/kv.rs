use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::warn;

use crate::db::{Collection, Store};
use crate::error::AppError;
use crate::models::{Courses, PendingAccount, PendingCourse, Users};

/// Key-value backend: each collection is one JSON document in the `kv`
/// table. Missing or unreadable documents read as an empty collection.
#[derive(Clone)]
pub struct KvStore {
    db: SqlitePool,
}

impl KvStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        // Every connection to `:memory:` opens a separate database, so an
        // in-memory store must stay on exactly one long-lived connection.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options.connect(database_url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }

    async fn get<T>(&self, collection: Collection) -> Result<T, AppError>
    where
        T: DeserializeOwned + Default,
    {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?1")
            .bind(collection.key())
            .fetch_optional(&self.db)
            .await?;

        let Some(raw) = raw else {
            return Ok(T::default());
        };
        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("ignoring malformed value under {}: {}", collection.key(), e);
                Ok(T::default())
            }
        }
    }

    async fn set<T>(&self, collection: Collection, value: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection.key())
        .bind(raw)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for KvStore {
    async fn users(&self) -> Result<Users, AppError> {
        self.get(Collection::Users).await
    }

    async fn set_users(&self, users: &Users) -> Result<(), AppError> {
        self.set(Collection::Users, users).await
    }

    async fn pending_accounts(&self) -> Result<Vec<PendingAccount>, AppError> {
        self.get(Collection::PendingAccounts).await
    }

    async fn set_pending_accounts(&self, pending: &[PendingAccount]) -> Result<(), AppError> {
        self.set(Collection::PendingAccounts, pending).await
    }

    async fn courses(&self) -> Result<Courses, AppError> {
        self.get(Collection::Courses).await
    }

    async fn set_courses(&self, courses: &Courses) -> Result<(), AppError> {
        self.set(Collection::Courses, courses).await
    }

    async fn pending_courses(&self) -> Result<Vec<PendingCourse>, AppError> {
        self.get(Collection::PendingCourses).await
    }

    async fn set_pending_courses(&self, pending: &[PendingCourse]) -> Result<(), AppError> {
        self.set(Collection::PendingCourses, pending).await
    }
}
