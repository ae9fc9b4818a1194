use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::AppError;
use crate::models::*;
use crate::services::PhotoUpload;
use crate::services::uploads::MAX_PHOTO_BYTES;
use crate::state::AppState;

/// Room for the text fields next to a maximum-size photo.
const ACCOUNT_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 64 * 1024;

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.photos.dir());
    let site = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/health", get(health))
        .route("/favicon.ico", get(favicon))
        .route("/courses", get(list_courses))
        .route("/courses/requests", post(request_course))
        .route("/auth/login", post(login))
        .route(
            "/accounts",
            post(create_account).layer(DefaultBodyLimit::max(ACCOUNT_BODY_LIMIT)),
        )
        .route("/accounts/check/{sid}", get(check_account))
        .route("/admin/pending/accounts", get(pending_accounts))
        .route("/admin/pending/accounts/{sid}/approve", post(approve_account))
        .route("/admin/pending/accounts/{sid}/reject", post(reject_account))
        .route("/admin/pending/courses", get(pending_courses))
        .route("/admin/pending/courses/{code}/approve", post(approve_course))
        .route("/admin/pending/courses/{code}/reject", post(reject_course))
        .nest_service("/uploads", uploads)
        .fallback_service(site)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.approvals.list_courses().await?;
    Ok(StatusCode::OK)
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Courses>>, AppError> {
    let courses = state.approvals.list_courses().await?;
    debug!("listing {} courses", courses.len());
    Ok(Json(ApiResponse::success(courses)))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let Json(req) = body.map_err(|_| AppError::Missing)?;
    let login = state.approvals.login(&req.sid, &req.password).await?;
    Ok(Json(ApiResponse::success(login)))
}

async fn create_account(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut sid = String::new();
    let mut password = String::new();
    let mut photo: Option<PhotoUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadUpload(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("sid") => {
                sid = field.text().await.map_err(|e| AppError::BadUpload(e.body_text()))?;
            }
            Some("password") => {
                password = field.text().await.map_err(|e| AppError::BadUpload(e.body_text()))?;
            }
            Some("photo") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadUpload(e.body_text()))?;
                if !data.is_empty() {
                    photo = Some(PhotoUpload { file_name, content_type, data: data.to_vec() });
                }
            }
            _ => {}
        }
    }

    let photo = photo.ok_or(AppError::Missing)?;

    state
        .approvals
        .submit_account_with_photo(&sid, &password, &photo, &state.photos)
        .await?;
    Ok(Json(ApiResponse::done()))
}

async fn check_account(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<ApiResponse<AccountCheck>>, AppError> {
    let check = state.approvals.check_account(&sid).await?;
    Ok(Json(ApiResponse::success(check)))
}

async fn pending_accounts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PendingAccount>>>, AppError> {
    let pending = state.approvals.pending_accounts().await?;
    Ok(Json(ApiResponse::success(pending)))
}

async fn approve_account(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.approvals.approve_account(&sid).await?;
    Ok(Json(ApiResponse::done()))
}

async fn reject_account(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.approvals.reject_account(&sid).await?;
    Ok(Json(ApiResponse::done()))
}

async fn request_course(
    State(state): State<AppState>,
    body: Result<Json<CourseRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(req) = body.map_err(|_| AppError::Missing)?;
    state.approvals.request_course(&req.code, &req.title).await?;
    Ok(Json(ApiResponse::done()))
}

async fn pending_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PendingCourse>>>, AppError> {
    let pending = state.approvals.pending_courses().await?;
    Ok(Json(ApiResponse::success(pending)))
}

async fn approve_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.approvals.approve_course(&code).await?;
    Ok(Json(ApiResponse::done()))
}

async fn reject_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.approvals.reject_course(&code).await?;
    Ok(Json(ApiResponse::done()))
}
