use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PendingStatus;

/// Approved courses, keyed by uppercased code, mapped to their title.
pub type Courses = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCourse {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub status: PendingStatus,
    pub ts: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: String,
}

/// Course codes are compared and stored uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_code_uppercases_and_trims() {
        assert_eq!(normalize_code(" cs101 "), "CS101");
        assert_eq!(normalize_code("Math-2a"), "MATH-2A");
        assert_eq!(normalize_code("   "), "");
    }

    #[test]
    fn pending_course_defaults_status() {
        let course: PendingCourse =
            serde_json::from_str(r#"{"code":"CS101","title":"Intro","ts":5}"#).unwrap();
        assert_eq!(course.status, PendingStatus::Pending);
    }
}
