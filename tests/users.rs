mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use yamdb::{error::AppError, models::Role};

#[tokio::test]
async fn me_cannot_change_own_role() {
    let app = TestApp::new().await;
    let token = app.token_for("plain", Role::User).await;

    let (status, body) =
        app.patch("/v1/users/me/", Some(&token), json!({"role": "admin", "bio": "hello"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["bio"], "hello");

    let (_, me) = app.get("/v1/users/me/", Some(&token)).await;
    assert_eq!(me["role"], "user");

    let (status, _) = app.get("/v1/users/", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_users() {
    let app = TestApp::new().await;
    let admin = app.token_for("root", Role::Admin).await;

    let (status, body) = app
        .post(
            "/v1/users/",
            Some(&admin),
            json!({"username": "mod1", "email": "mod1@example.com", "role": "moderator"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({
            "username": "mod1",
            "email": "mod1@example.com",
            "first_name": "",
            "last_name": "",
            "bio": "",
            "role": "moderator"
        })
    );

    let body = json!({"username": "mod1", "email": "x@example.com"});
    let (status, body) = app.post("/v1/users/", Some(&admin), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());

    let (status, body) = app.get("/v1/users/mod1/", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");

    let (status, body) = app.patch("/v1/users/mod1/", Some(&admin), json!({"role": "admin"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, body) = app.get("/v1/users/?search=mod", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = app.delete("/v1/users/mod1/", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/v1/users/mod1/", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_cannot_create_reserved_username() {
    let app = TestApp::new().await;
    let admin = app.token_for("root", Role::Admin).await;
    let body = json!({"username": "me", "email": "me@example.com"});
    let (status, body) = app.post("/v1/users/", Some(&admin), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());
}

#[tokio::test]
async fn moderator_is_not_admin() {
    let app = TestApp::new().await;
    let moderator = app.token_for("moddy", Role::Moderator).await;
    let (status, _) = app.get("/v1/users/", Some(&moderator)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/v1/users/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn superuser_is_created_or_promoted() {
    let app = TestApp::new().await;
    let store = &app.state.store;

    let created = store.upsert_superuser("boss", "boss@example.com").await.unwrap();
    assert!(created.is_superuser);
    assert_eq!(created.role(), Role::Admin);

    app.token_for("plain", Role::User).await;
    let promoted = store.upsert_superuser("plain", "plain@example.com").await.unwrap();
    assert!(promoted.is_superuser);
    assert_eq!(promoted.role(), Role::Admin);
    let again = store.find_user_by_username("plain").await.unwrap().unwrap();
    assert_eq!(again.id, promoted.id);

    let err = store.upsert_superuser("plain", "other@example.com").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref fields) if fields.contains_key("email")));
    let err = store.upsert_superuser("fresh", "boss@example.com").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref fields) if fields.contains_key("email")));

    let (_, page) = app.get("/v1/users/", Some(&app.state.tokens.issue(&created).unwrap())).await;
    assert_eq!(page["count"], 2);
}
