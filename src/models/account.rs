use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PendingStatus;

/// Active users, keyed by student/staff id.
pub type Users = BTreeMap<String, User>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAccount {
    pub sid: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(default)]
    pub status: PendingStatus,
    pub ts: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub sid: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountLocation {
    Users,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountCheck {
    pub exists: bool,
    #[serde(rename = "where")]
    pub location: Option<AccountLocation>,
}

/// Ids are compared and stored without surrounding whitespace.
pub fn normalize_sid(sid: &str) -> &str {
    sid.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_reads_stored_shape() {
        let users: Users = serde_json::from_str(
            r#"{"s1":{"password":"$2b$12$abc","photoPath":"/uploads/a.png"},"root":{"password":"pw","role":"admin"}}"#,
        )
        .unwrap();

        assert_eq!(users["s1"].role, Role::User);
        assert_eq!(users["s1"].photo_path.as_deref(), Some("/uploads/a.png"));
        assert_eq!(users["root"].role, Role::Admin);
        assert_eq!(users["root"].photo_path, None);
    }

    #[test]
    fn photo_path_is_omitted_when_absent() {
        let pending = PendingAccount {
            sid: "s1".to_string(),
            password: "$2b$04$hash".to_string(),
            photo_path: None,
            status: PendingStatus::Pending,
            ts: 7,
        };
        let user = User { password: "$2b$04$hash".to_string(), role: Role::User, photo_path: None };

        let pending_json = serde_json::to_value(&pending).unwrap();
        assert!(pending_json.get("photoPath").is_none());
        assert_eq!(pending_json["status"], "pending");
        assert!(serde_json::to_value(&user).unwrap().get("photoPath").is_none());

        let with_photo = PendingAccount { photo_path: Some("/uploads/a.png".to_string()), ..pending };
        assert_eq!(serde_json::to_value(&with_photo).unwrap()["photoPath"], "/uploads/a.png");
    }

    #[test]
    fn normalize_sid_trims() {
        assert_eq!(normalize_sid("  s1001\n"), "s1001");
        assert_eq!(normalize_sid("s 1"), "s 1");
    }

    #[test]
    fn account_check_serializes_where() {
        let check = AccountCheck { exists: true, location: Some(AccountLocation::Pending) };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json, serde_json::json!({"exists": true, "where": "pending"}));
    }
}
