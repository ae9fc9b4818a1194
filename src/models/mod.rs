pub mod account;
pub mod course;
pub mod response;

use serde::{Deserialize, Serialize};

pub use account::{
    AccountCheck, AccountLocation, LoginRequest, LoginResponse, PendingAccount, Role, User, Users,
    normalize_sid,
};
pub use course::{CourseRequest, Courses, PendingCourse, normalize_code};
pub use response::ApiResponse;

/// Lifecycle marker on queued requests. Approve and reject remove the
/// item outright, so only `pending` is ever persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    #[default]
    Pending,
}
