pub mod file;
pub mod kv;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Courses, PendingAccount, PendingCourse, Users};

pub use file::FileStore;
pub use kv::KvStore;

/// The four persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    PendingAccounts,
    Courses,
    PendingCourses,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::PendingAccounts,
        Collection::Courses,
        Collection::PendingCourses,
    ];

    /// Key under which the collection lives in a key-value backend.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Users => "efs_users",
            Collection::PendingAccounts => "efs_pending_accounts",
            Collection::Courses => "efs_courses",
            Collection::PendingCourses => "efs_pending_courses",
        }
    }

    /// File name used by the file backend.
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::PendingAccounts => "pendingAccounts.json",
            Collection::Courses => "courses.json",
            Collection::PendingCourses => "pendingCourses.json",
        }
    }
}

/// Whole-collection persistence. Every setter overwrites the stored
/// collection; callers read, mutate and write back.
#[async_trait]
pub trait Store: Send + Sync {
    async fn users(&self) -> Result<Users, AppError>;
    async fn set_users(&self, users: &Users) -> Result<(), AppError>;

    async fn pending_accounts(&self) -> Result<Vec<PendingAccount>, AppError>;
    async fn set_pending_accounts(&self, pending: &[PendingAccount]) -> Result<(), AppError>;

    async fn courses(&self) -> Result<Courses, AppError>;
    async fn set_courses(&self, courses: &Courses) -> Result<(), AppError>;

    async fn pending_courses(&self) -> Result<Vec<PendingCourse>, AppError>;
    async fn set_pending_courses(&self, pending: &[PendingCourse]) -> Result<(), AppError>;
}
