//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cadence_core::types::{AssetUpload, NewTrack, Track, User};
use cadence_server::{
    api, config::ServerConfig, middleware::auth::USER_ID_HEADER, state::AppState, MemoryMailer,
};
use cadence_storage::SqliteStore;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "cadence-test-boundary";
pub const TEST_PASSWORD: &str = "secret123";

/// Router plus direct access to the services behind it
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<MemoryMailer>,
    pub dir: TempDir,
}

/// Fresh database and upload directory per test
pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

pub async fn test_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let dir = TempDir::new().unwrap();

    let mut config = ServerConfig::default();
    config.storage.database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    config.storage.upload_dir = dir.path().join("uploads");
    configure(&mut config);

    let pool = cadence_storage::create_pool(&config.storage.database_url)
        .await
        .unwrap();
    cadence_storage::run_migrations(&pool).await.unwrap();

    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState::build(config, SqliteStore::new(pool), mailer.clone(), 4)
        .await
        .unwrap();

    TestApp {
        router: api::create_router(state.clone()),
        state,
        mailer,
        dir,
    }
}

impl TestApp {
    pub async fn user(&self, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        self.state
            .accounts
            .create_user(name, &email, TEST_PASSWORD, false)
            .await
            .unwrap()
    }

    pub async fn admin(&self, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        self.state
            .accounts
            .create_user(name, &email, TEST_PASSWORD, true)
            .await
            .unwrap()
    }

    /// Seed a track through the library, assets included
    pub async fn track(&self, admin: &User, title: &str) -> Track {
        let new_track = NewTrack {
            title: title.to_string(),
            artist: "Test Artist".to_string(),
            album: "Test Album".to_string(),
            genre: "Rock".to_string(),
            duration_secs: Some(180),
            ..Default::default()
        };
        self.state
            .library
            .create_track(
                &admin.caller(),
                new_track,
                Some(AssetUpload::new("cover.png", b"png".to_vec())),
                Some(AssetUpload::new("song.mp3", b"mp3".to_vec())),
            )
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, user: Option<&User>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, user, None)).await
    }

    pub async fn post(&self, uri: &str, user: Option<&User>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, user, Some(body))).await
    }

    pub async fn put(&self, uri: &str, user: Option<&User>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PUT, uri, user, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&User>) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, user, None)).await
    }

    pub async fn upload(
        &self,
        method: Method,
        uri: &str,
        user: &User,
        form: &MultipartBody,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, user.id.as_str())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }
}

pub fn request(method: Method, uri: &str, user: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.as_str());
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = self.bytes.clone();
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }
}
