#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use yamdb::{
    AppState,
    config::Config,
    db,
    mail::MemoryMailer,
    models::{CreateUserRequest, Role},
    store::Store,
};

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<MemoryMailer>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.sqlite3").display());
        let conn = db::connect_and_migrate(&url).await.unwrap();
        let mailer = Arc::new(MemoryMailer::default());
        let state =
            Arc::new(AppState::new(Arc::new(Config::local(url)), Store::new(conn), mailer.clone()));
        Self { app: yamdb::app(state.clone()), state, mailer, _dir: dir }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json =
            if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn signup(&self, username: &str, email: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({"username": username, "email": email});
        self.post("/v1/auth/signup/", None, body).await
    }

    /// Inserts a user with `role` directly and returns an access token for it.
    pub async fn token_for(&self, username: &str, role: Role) -> String {
        let user = self
            .state
            .store
            .create_user(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                first_name: String::new(),
                last_name: String::new(),
                bio: String::new(),
                role,
            })
            .await
            .unwrap();
        self.state.tokens.issue(&user).unwrap()
    }

    /// Last confirmation code mailed to `email`.
    pub fn last_code_for(&self, email: &str) -> String {
        let sent = self.mailer.sent();
        let mail = sent.iter().rev().find(|m| m.to == email).expect("no mail for address");
        mail.body.rsplit(' ').next().unwrap().to_string()
    }

    /// Admin-created catalog: categories `movie`, `book`; genres `drama`, `comedy`.
    pub async fn seed_catalog(&self, admin: &str) {
        for (name, slug) in [("Movie", "movie"), ("Book", "book")] {
            let body = serde_json::json!({"name": name, "slug": slug});
            let (status, _) = self.post("/v1/categories/", Some(admin), body).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        for (name, slug) in [("Drama", "drama"), ("Comedy", "comedy")] {
            let body = serde_json::json!({"name": name, "slug": slug});
            let (status, _) = self.post("/v1/genres/", Some(admin), body).await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    pub async fn create_title(&self, admin: &str, body: Value) -> i64 {
        let (status, json) = self.post("/v1/titles/", Some(admin), body).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_i64().unwrap()
    }
}
