use enrollment::config::{AppConfig, StoreBackend};
use enrollment::error::AppError;
use enrollment::models::Role;
use enrollment::state::AppState;
use serde_json::Value;
use tempfile::tempdir;

fn file_config(root: &std::path::Path) -> AppConfig {
    AppConfig {
        backend: StoreBackend::File,
        data_dir: root.join("data"),
        uploads_dir: root.join("uploads"),
        static_dir: root.join("static"),
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

fn read_json(path: std::path::PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).expect("file exists")).expect("valid json")
}

#[tokio::test]
async fn test_state_survives_restart() {
    let root = tempdir().unwrap();
    let config = file_config(root.path());

    {
        let state = AppState::from_config(&config).await.unwrap();
        state.approvals.submit_account("s1", "pw", None).await.unwrap();
        state.approvals.approve_account("s1").await.unwrap();
        state.approvals.request_course("ph100", "Physics").await.unwrap();
    }

    let users = read_json(root.path().join("data/users.json"));
    assert!(users["s1"]["password"].as_str().unwrap().starts_with("$2"));
    assert_eq!(users["s1"]["role"], "user");
    assert_eq!(read_json(root.path().join("data/pendingAccounts.json")), serde_json::json!([]));
    assert_eq!(read_json(root.path().join("data/pendingCourses.json"))[0]["code"], "PH100");

    let state = AppState::from_config(&config).await.unwrap();
    assert_eq!(state.approvals.login("s1", "pw").await.unwrap().role, Role::User);
    assert!(matches!(
        state.approvals.request_course("PH100", "Again").await,
        Err(AppError::Exists)
    ));
}

#[tokio::test]
async fn test_seeded_plaintext_passwords_are_hashed_on_startup() {
    let root = tempdir().unwrap();
    let data = root.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("users.json"),
        r#"{"staff1": {"password": "letmein", "role": "admin"}}"#,
    )
    .unwrap();
    std::fs::write(data.join("courses.json"), r#"{"CS101": "Intro to CS"}"#).unwrap();

    let state = AppState::from_config(&file_config(root.path())).await.unwrap();

    let users = read_json(data.join("users.json"));
    let stored = users["staff1"]["password"].as_str().unwrap();
    assert_ne!(stored, "letmein");
    assert!(stored.starts_with("$2"));

    let login = state.approvals.login("staff1", "letmein").await.unwrap();
    assert_eq!(login.role, Role::Admin);

    let courses = state.approvals.list_courses().await.unwrap();
    assert_eq!(courses.get("CS101").map(String::as_str), Some("Intro to CS"));
}

#[tokio::test]
async fn test_configured_admin_is_created() {
    let root = tempdir().unwrap();
    let config = AppConfig {
        admin: Some(("root".to_string(), "toor".to_string())),
        ..file_config(root.path())
    };

    let state = AppState::from_config(&config).await.unwrap();
    assert_eq!(state.approvals.login("root", "toor").await.unwrap().role, Role::Admin);

    // A restart leaves the existing admin untouched.
    let state = AppState::from_config(&config).await.unwrap();
    assert_eq!(state.approvals.login("root", "toor").await.unwrap().role, Role::Admin);
}

#[tokio::test]
async fn test_kv_backend_persists_in_database_file() {
    let root = tempdir().unwrap();
    let db_path = root.path().join("enrollment.db");
    let config = AppConfig {
        backend: StoreBackend::Kv,
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..file_config(root.path())
    };

    {
        let state = AppState::from_config(&config).await.unwrap();
        state.approvals.request_course("bio1", "Biology").await.unwrap();
        state.approvals.approve_course("BIO1").await.unwrap();
    }

    let state = AppState::from_config(&config).await.unwrap();
    let courses = state.approvals.list_courses().await.unwrap();
    assert_eq!(courses.get("BIO1").map(String::as_str), Some("Biology"));
    assert!(state.approvals.pending_courses().await.unwrap().is_empty());
}
