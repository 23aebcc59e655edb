use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use cms_backend::config::AppConfig;
use cms_backend::infrastructure::{database, seed};
use cms_backend::services::file_service::FileService;
use cms_backend::services::storage::StorageService;
use cms_backend::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub struct MockStorageService {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Key not found"))
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<GetObjectOutput> {
        let data = self
            .files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Key not found"))?;
        Ok(GetObjectOutput::builder()
            .body(ByteStream::from(data))
            .build())
    }

    async fn presigned_url(
        &self,
        key: &str,
        _expires_in_secs: u64,
        _content_disposition: &str,
    ) -> anyhow::Result<String> {
        Ok(format!("https://mock-bucket.local/{}?X-Amz-Mock=true", key))
    }
}

/// Fresh app over in-memory SQLite with schema bootstrap, seed data and a
/// mock object store. One connection so the memory database is shared.
pub async fn setup_app() -> Router {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();

    database::run_migrations(&db).await.unwrap();

    let config = AppConfig::development();
    seed::seed_initial_data(&db, &config).await.unwrap();

    let storage: Arc<dyn StorageService> = Arc::new(MockStorageService::new());
    let file_service = Arc::new(FileService::new(db.clone(), storage.clone(), config.clone()));

    let state = AppState {
        db,
        storage,
        file_service,
        cache: cms_backend::services::cache::ResponseCache::new(),
        config,
    };

    create_app(state)
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Raw variant for responses that are not JSON (downloads).
pub async fn request_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, bytes.to_vec(), headers)
}

pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/register",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    login(app, username, password).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

pub async fn login_admin(app: &Router) -> String {
    login(app, "admin", "admin123").await
}

/// Upload a file through the multipart endpoint.
pub async fn upload(
    app: &Router,
    token: &str,
    filename: &str,
    mime: &str,
    data: &[u8],
    folder_id: Option<&str>,
) -> (StatusCode, Value) {
    const BOUNDARY: &str = "TESTBOUNDARY1234567890";

    let mut body = Vec::new();
    if let Some(folder_id) = folder_id {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n{}\r\n",
                BOUNDARY, folder_id
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, filename, mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Look up a user's id via the admin listing.
pub async fn user_id_of(app: &Router, admin_token: &str, username: &str) -> String {
    let (status, body) = request(app, "GET", "/users", Some(admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == username)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Look up a role id by name.
pub async fn role_id_of(app: &Router, admin_token: &str, name: &str) -> String {
    let (status, body) = request(app, "GET", "/roles", Some(admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Assign a single role to a user by names.
pub async fn assign_role(app: &Router, admin_token: &str, username: &str, role_name: &str) {
    let user_id = user_id_of(app, admin_token, username).await;
    let role_id = role_id_of(app, admin_token, role_name).await;

    let (status, _) = request(
        app,
        "PUT",
        &format!("/users/{}/roles", user_id),
        Some(admin_token),
        Some(serde_json::json!({ "role_ids": [role_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
