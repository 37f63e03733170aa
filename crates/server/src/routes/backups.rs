//! Backup listing, creation, restore and download endpoints.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use peekaboo_db::{BackupInfo, BackupOutcome, DbError};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Backups shown on the export page.
const LISTED_BACKUPS: usize = 10;

/// Uploaded database files are held in memory up to this size.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Multipart field carrying the uploaded database.
const UPLOAD_FIELD: &str = "backup_file";

#[derive(Debug, Serialize)]
pub struct CreateBackupResponse {
    pub success: bool,
    pub backup: String,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub success: bool,
    /// Copy of the database as it was just before the restore.
    pub safety_backup: Option<String>,
}

impl RestoreResponse {
    fn from_safety(outcome: &BackupOutcome) -> Self {
        Self {
            success: true,
            safety_backup: outcome.path().map(|p| p.display().to_string()),
        }
    }
}

/// GET /api/backups - The newest backups, newest first.
pub async fn list_backups(State(state): State<Arc<AppState>>) -> Json<Vec<BackupInfo>> {
    let mut backups = state.db.backups().list();
    backups.truncate(LISTED_BACKUPS);
    Json(backups)
}

/// POST /api/backups - Take a manual backup.
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CreateBackupResponse>> {
    let settings = state.settings.load();
    let outcome = state.db.create_backup(settings.max_backups).await;
    metrics::record_backup("manual", &outcome);

    match outcome {
        BackupOutcome::Created { path, .. } => Ok(Json(CreateBackupResponse {
            success: true,
            backup: path.display().to_string(),
        })),
        BackupOutcome::Skipped => Err(ApiError::Internal("Backup creation failed".to_string())),
        BackupOutcome::Failed(reason) => {
            tracing::error!(%reason, "Manual backup failed");
            Err(ApiError::Internal("Backup creation failed".to_string()))
        }
    }
}

/// POST /api/backups/{name}/restore - Replace the database with a backup.
pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<RestoreResponse>> {
    let settings = state.settings.load();
    let safety = state
        .db
        .restore_from_backup(&name, settings.max_backups)
        .await?;
    metrics::record_backup("restore", &safety);
    metrics::record_restore("named");
    tracing::info!(backup = %name, "Restored from backup");

    Ok(Json(RestoreResponse::from_safety(&safety)))
}

/// GET /api/backups/{name} - Download a backup file.
pub async fn download_backup(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let path = state.db.backups().resolve(&name)?;
    let bytes = tokio::fs::read(&path).await.map_err(DbError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/backups/upload - Restore from an uploaded `.db` file.
///
/// Expects a multipart form with the file in the `backup_file` field.
pub async fn upload_backup(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<RestoreResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    let settings = state.settings.load();
    let safety = state
        .db
        .restore_from_upload(&file_name, &bytes, settings.max_backups)
        .await?;
    metrics::record_backup("restore", &safety);
    metrics::record_restore("upload");
    tracing::info!(file = %file_name, size = bytes.len(), "Restored from uploaded file");

    Ok(Json(RestoreResponse::from_safety(&safety)))
}

/// Create the backup routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/backups", get(list_backups).post(create_backup))
        .route(
            "/backups/upload",
            post(upload_backup).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/backups/{name}", get(download_backup))
        .route("/backups/{name}/restore", post(restore_backup))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use chrono::NaiveDate;
    use peekaboo_core::paths::AppPaths;
    use peekaboo_core::NewProgress;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use crate::state::AppState;

    const BOUNDARY: &str = "peekaboo-test-boundary";

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn do_get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn do_post(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn do_upload(app: axum::Router, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/api/backups/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_manual_backup_then_list() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();
        let app = crate::create_app(state.clone());

        let (status, body) = do_post(app.clone(), "/api/backups").await;
        assert_eq!(status, StatusCode::OK);
        let created = json(&body);
        assert_eq!(created["success"], true);
        assert!(created["backup"]
            .as_str()
            .unwrap()
            .contains("peekaboo_backup_"));

        let (status, body) = do_get(app, "/api/backups").await;
        assert_eq!(status, StatusCode::OK);
        let listed = json(&body);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert!(listed[0]["size_bytes"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_list_is_capped_and_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();
        for day in 1..=12 {
            let at = NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap();
            state
                .db
                .backups()
                .create_from_at(state.db.db_path(), at, 50);
        }

        let (_, body) = do_get(crate::create_app(state), "/api/backups").await;
        let listed = json(&body);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0]["name"], "peekaboo_backup_20240112_090000.db");
        assert_eq!(listed[0]["date"], "2024-01-12 09:00:00");
    }

    #[tokio::test]
    async fn test_restore_named_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();
        state
            .db
            .append_progress(&NewProgress::new(1, 1, 5, 5, 5))
            .await
            .unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        state
            .db
            .backups()
            .create_from_at(state.db.db_path(), at, 10);
        state
            .db
            .append_progress(&NewProgress::new(1, 2, 5, 5, 5))
            .await
            .unwrap();

        let (status, body) = do_post(
            crate::create_app(state.clone()),
            "/api/backups/peekaboo_backup_20240101_090000.db/restore",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let restored = json(&body);
        assert_eq!(restored["success"], true);
        assert!(restored["safety_backup"].is_string());

        let info = state.db.database_info().await.unwrap();
        assert_eq!(info.sessions_count, 1);
    }

    #[tokio::test]
    async fn test_restore_unknown_backup_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();

        let (status, body) = do_post(
            crate::create_app(state),
            "/api/backups/peekaboo_backup_20990101_000000.db/restore",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json(&body)["error"].is_string());
    }

    #[tokio::test]
    async fn test_download_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        state
            .db
            .backups()
            .create_from_at(state.db.db_path(), at, 10);
        let app = crate::create_app(state);

        let (status, body) = do_get(app.clone(), "/api/backups/peekaboo_backup_20240101_090000.db").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with(b"SQLite format 3\0"));

        let (status, _) = do_get(app, "/api/backups/missing.db").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_restores_database() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = AppState::open(&AppPaths::new(source_dir.path())).await.unwrap();
        for day in 1..=3 {
            source
                .db
                .append_progress(&NewProgress::new(2, day, 6, 6, 6))
                .await
                .unwrap();
        }
        let upload = std::fs::read(source.db.db_path()).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();

        let (status, body) = do_upload(
            crate::create_app(state.clone()),
            multipart_body("backup_file", "mine.db", &upload),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);

        let info = state.db.database_info().await.unwrap();
        assert_eq!(info.sessions_count, 3);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::open(&AppPaths::new(tmp.path())).await.unwrap();
        let app = crate::create_app(state.clone());

        let (status, body) =
            do_upload(app.clone(), multipart_body("other", "mine.db", b"x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");

        let (status, body) = do_upload(
            app.clone(),
            multipart_body("backup_file", "notes.txt", b"SQLite format 3\0"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please upload a .db file");

        let (status, _) = do_upload(
            app,
            multipart_body("backup_file", "fake.db", b"definitely not sqlite"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(state.db.backups().scan().is_empty(), "rejected uploads take no backup");
    }
}
