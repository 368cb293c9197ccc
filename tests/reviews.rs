mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use yamdb::models::Role;

async fn setup() -> (TestApp, String, i64) {
    let app = TestApp::new().await;
    let admin = app.token_for("root", Role::Admin).await;
    app.seed_catalog(&admin).await;
    let body = json!({"name": "Alien", "year": 1979, "genre": ["drama"], "category": "movie"});
    let id = app.create_title(&admin, body).await;
    (app, admin, id)
}

#[tokio::test]
async fn one_review_per_author_per_title() {
    let (app, _, title) = setup().await;
    let user = app.token_for("critic", Role::User).await;
    let url = format!("/v1/titles/{title}/reviews/");

    let (status, review) = app.post(&url, Some(&user), json!({"text": "Great", "score": 9})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["author"], "critic");
    assert_eq!(review["score"], 9);
    assert!(review["pub_date"].as_str().unwrap().ends_with('Z'));

    let (status, err) = app.post(&url, Some(&user), json!({"text": "Again", "score": 3})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err.get("non_field_errors").is_some());

    let (_, page) = app.get(&url, None).await;
    assert_eq!(page["count"], 1);
}

#[tokio::test]
async fn score_must_be_in_range() {
    let (app, _, title) = setup().await;
    let user = app.token_for("critic", Role::User).await;
    let url = format!("/v1/titles/{title}/reviews/");
    for score in [0, 11] {
        let (status, err) =
            app.post(&url, Some(&user), json!({"text": "Meh", "score": score})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err.get("score").is_some());
    }

    let (_, review) = app.post(&url, Some(&user), json!({"text": "Fine", "score": 5})).await;
    let review_url = format!("{url}{}/", review["id"]);
    for score in [0, 11] {
        let (status, err) = app.patch(&review_url, Some(&user), json!({"score": score})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err.get("score").is_some());
    }
    let (_, review) = app.get(&review_url, None).await;
    assert_eq!(review["score"], 5);
}

#[tokio::test]
async fn rating_is_mean_of_scores() {
    let (app, _, title) = setup().await;
    let url = format!("/v1/titles/{title}/reviews/");

    let (_, body) = app.get(&format!("/v1/titles/{title}/"), None).await;
    assert!(body["rating"].is_null());

    for (name, score) in [("a", 10), ("b", 7), ("c", 4)] {
        let token = app.token_for(name, Role::User).await;
        let (status, _) = app.post(&url, Some(&token), json!({"text": "x", "score": score})).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get(&format!("/v1/titles/{title}/"), None).await;
    assert_eq!(body["rating"].as_f64(), Some(7.0));

    let (_, page) = app.get("/v1/titles/", None).await;
    assert_eq!(page["results"][0]["rating"].as_f64(), Some(7.0));
}

#[tokio::test]
async fn only_author_moderator_or_admin_can_modify() {
    let (app, admin, title) = setup().await;
    let author = app.token_for("author", Role::User).await;
    let other = app.token_for("other", Role::User).await;
    let moderator = app.token_for("moddy", Role::Moderator).await;

    let reviews_url = format!("/v1/titles/{title}/reviews/");
    let (_, review) =
        app.post(&reviews_url, Some(&author), json!({"text": "Hi", "score": 5})).await;
    let url = format!("{reviews_url}{}/", review["id"]);

    let (status, _) = app.patch(&url, None, json!({"text": "anon"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.patch(&url, Some(&other), json!({"text": "hijack"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&url, Some(&author), json!({"score": 6})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 6);
    assert_eq!(body["text"], "Hi");

    let (status, body) = app.patch(&url, Some(&moderator), json!({"text": "moderated"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "moderated");
    assert_eq!(body["author"], "author");

    let (status, _) = app.delete(&url, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&url, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&url, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_parents_are_not_found() {
    let (app, _, title) = setup().await;
    let user = app.token_for("critic", Role::User).await;

    let (status, _) = app.get("/v1/titles/9999/reviews/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = json!({"text": "x", "score": 5});
    let (status, _) = app.post("/v1/titles/9999/reviews/", Some(&user), body.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/v1/titles/{title}/reviews/9999/comments/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post(&format!("/v1/titles/{title}/reviews/"), None, body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comments_lifecycle_and_ordering() {
    let (app, _, title) = setup().await;
    let author = app.token_for("author", Role::User).await;
    let other = app.token_for("other", Role::User).await;

    let reviews_url = format!("/v1/titles/{title}/reviews/");
    let (_, review) =
        app.post(&reviews_url, Some(&author), json!({"text": "Hi", "score": 5})).await;
    let url = format!("{reviews_url}{}/comments/", review["id"]);

    let (status, first) = app.post(&url, Some(&other), json!({"text": "first"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["author"], "other");
    let (_, second) = app.post(&url, Some(&author), json!({"text": "second"})).await;

    let (_, page) = app.get(&url, None).await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["id"], second["id"]);
    assert_eq!(page["results"][1]["id"], first["id"]);

    let comment_url = format!("{url}{}/", first["id"]);
    let (status, _) = app.patch(&comment_url, Some(&author), json!({"text": "edited"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.patch(&comment_url, Some(&other), json!({"text": "edited"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "edited");

    let (status, err) = app.post(&url, Some(&other), json!({"text": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err.get("text").is_some());

    let (status, _) = app.delete(&comment_url, Some(&other)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&comment_url, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_title_cascades_to_reviews_and_comments() {
    let (app, admin, title) = setup().await;
    let user = app.token_for("critic", Role::User).await;
    let reviews_url = format!("/v1/titles/{title}/reviews/");
    let (_, review) = app.post(&reviews_url, Some(&user), json!({"text": "Hi", "score": 5})).await;
    let review_id = review["id"].as_i64().unwrap();
    app.post(
        &format!("/v1/titles/{title}/reviews/{review_id}/comments/"),
        Some(&user),
        json!({"text": "c"}),
    )
    .await;

    let (status, _) = app.delete(&format!("/v1/titles/{title}/"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let store = &app.state.store;
    assert!(store.find_review(title as i32, review_id as i32).await.unwrap().is_none());
    assert!(store.find_comment(review_id as i32, 1).await.unwrap().is_none());
    let (status, _) = app.get(&format!("/v1/titles/{title}/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_user_removes_their_reviews_and_comments() {
    let (app, admin, title) = setup().await;
    let critic = app.token_for("critic", Role::User).await;
    let fan = app.token_for("fan", Role::User).await;
    let reviews_url = format!("/v1/titles/{title}/reviews/");

    let (_, own) = app.post(&reviews_url, Some(&critic), json!({"text": "Mine", "score": 2})).await;
    let (_, kept) = app.post(&reviews_url, Some(&fan), json!({"text": "Kept", "score": 8})).await;
    let comments_url = format!("{reviews_url}{}/comments/", kept["id"]);
    app.post(&comments_url, Some(&critic), json!({"text": "by critic"})).await;
    app.post(&comments_url, Some(&fan), json!({"text": "by fan"})).await;

    let (status, _) = app.delete("/v1/users/critic/", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, page) = app.get(&reviews_url, None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], kept["id"]);
    let (status, _) = app.get(&format!("{reviews_url}{}/", own["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.get(&comments_url, None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["author"], "fan");

    let (_, body) = app.get(&format!("/v1/titles/{title}/"), None).await;
    assert_eq!(body["rating"].as_f64(), Some(8.0));
}
