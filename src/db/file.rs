use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::db::{Collection, Store};
use crate::error::AppError;
use crate::models::{Courses, PendingAccount, PendingCourse, Users};

#[derive(Debug, Default)]
struct Collections {
    users: Users,
    pending_accounts: Vec<PendingAccount>,
    courses: Courses,
    pending_courses: Vec<PendingCourse>,
}

/// File backend: collections are served from memory and the affected
/// collection is rewritten as pretty-printed JSON on every set.
pub struct FileStore {
    dir: PathBuf,
    state: RwLock<Collections>,
}

impl FileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let state = Collections {
            users: load_collection(&dir, Collection::Users).await?,
            pending_accounts: load_collection(&dir, Collection::PendingAccounts).await?,
            courses: load_collection(&dir, Collection::Courses).await?,
            pending_courses: load_collection(&dir, Collection::PendingCourses).await?,
        };

        info!(
            "loaded {} users, {} pending accounts, {} courses, {} pending courses from {}",
            state.users.len(),
            state.pending_accounts.len(),
            state.courses.len(),
            state.pending_courses.len(),
            dir.display()
        );

        Ok(Self { dir, state: RwLock::new(state) })
    }

    async fn flush<T>(&self, collection: Collection, value: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(collection.file_name()), body).await?;
        Ok(())
    }
}

async fn load_collection<T>(dir: &Path, collection: Collection) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let path = dir.join(collection.file_name());
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if raw.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("invalid JSON in {}: {}", path.display(), e);
            Ok(T::default())
        }
    }
}

#[async_trait]
impl Store for FileStore {
    async fn users(&self) -> Result<Users, AppError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn set_users(&self, users: &Users) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.users = users.clone();
        self.flush(Collection::Users, &state.users).await
    }

    async fn pending_accounts(&self) -> Result<Vec<PendingAccount>, AppError> {
        Ok(self.state.read().await.pending_accounts.clone())
    }

    async fn set_pending_accounts(&self, pending: &[PendingAccount]) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.pending_accounts = pending.to_vec();
        self.flush(Collection::PendingAccounts, &state.pending_accounts).await
    }

    async fn courses(&self) -> Result<Courses, AppError> {
        Ok(self.state.read().await.courses.clone())
    }

    async fn set_courses(&self, courses: &Courses) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.courses = courses.clone();
        self.flush(Collection::Courses, &state.courses).await
    }

    async fn pending_courses(&self) -> Result<Vec<PendingCourse>, AppError> {
        Ok(self.state.read().await.pending_courses.clone())
    }

    async fn set_pending_courses(&self, pending: &[PendingCourse]) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state.pending_courses = pending.to_vec();
        self.flush(Collection::PendingCourses, &state.pending_courses).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PendingStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_empty_dir() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert!(store.users().await.unwrap().is_empty());
        assert!(store.pending_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_writes_collection_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let pending = vec![PendingCourse {
            code: "CS101".to_string(),
            title: "Intro".to_string(),
            status: PendingStatus::Pending,
            ts: 42,
        }];
        store.set_pending_courses(&pending).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("pendingCourses.json")).unwrap();
        let on_disk: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            on_disk,
            serde_json::json!([{"code": "CS101", "title": "Intro", "status": "pending", "ts": 42}])
        );
        assert!(!dir.path().join("courses.json").exists());
    }

    #[tokio::test]
    async fn test_reopen_restores_state() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            let mut courses = Courses::new();
            courses.insert("MA201".to_string(), "Calculus".to_string());
            store.set_courses(&courses).await.unwrap();
        }

        let reopened = FileStore::open(dir.path()).await.unwrap();
        let courses = reopened.courses().await.unwrap();
        assert_eq!(courses.get("MA201").map(String::as_str), Some("Calculus"));
    }

    #[tokio::test]
    async fn test_invalid_or_empty_files_load_as_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), "{ broken").unwrap();
        std::fs::write(dir.path().join("courses.json"), "   \n").unwrap();

        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.users().await.unwrap().is_empty());
        assert!(store.courses().await.unwrap().is_empty());
    }
}
