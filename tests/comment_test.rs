mod common;

use serde_json::Value;

#[tokio::test]
async fn comment_on_event_and_list() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "cev").await;
    let event_id = common::create_test_event(&app, &token, "Discussed").await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/comments", event_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "Looking forward to it" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}/comments", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let comments = body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["body"], "Looking forward to it");
}

#[tokio::test]
async fn comment_on_user_profile() {
    let app = common::spawn_app().await;
    let (_id1, token, _n1) = common::create_test_user(&app, "aut").await;
    let (_id2, _t2, target_name) = common::create_test_user(&app, "tgt").await;

    let resp = app
        .client
        .post(app.url(&format!(
            "/users/{}/comments",
            target_name.replace(' ', "%20")
        )))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "Nice profile" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!(
            "/users/{}/comments",
            target_name.replace(' ', "%20")
        )))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn commenting_on_missing_event_fails() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "mis").await;

    let resp = app
        .client
        .post(app.url("/events/999999/comments"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "Into the void" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn commented_partition_splits_by_target_type() {
    let app = common::spawn_app().await;
    let (_id, token, name) = common::create_test_user(&app, "par").await;
    let (_id2, _t2, other_name) = common::create_test_user(&app, "oth").await;

    let event_id = common::create_test_event(&app, &token, "Partitioned").await;

    // One comment on an event, one on a user
    app.client
        .post(app.url(&format!("/events/{}/comments", event_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "On the event" }))
        .send()
        .await
        .unwrap();
    app.client
        .post(app.url(&format!(
            "/users/{}/comments",
            other_name.replace(' ', "%20")
        )))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "On the user" }))
        .send()
        .await
        .unwrap();

    let encoded = name.replace(' ', "%20");

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/commented-events", encoded)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let events = body["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"].as_i64().unwrap() as i32, event_id);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/commented-users", encoded)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], other_name);
    // Targets come back through the attribute path, not as raw rows
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn only_the_author_can_delete_a_comment() {
    let app = common::spawn_app().await;
    let (_id1, author_token, _n1) = common::create_test_user(&app, "del").await;
    let (_id2, other_token, _n2) = common::create_test_user(&app, "ntd").await;
    let event_id = common::create_test_event(&app, &author_token, "Moderated").await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/comments", event_id)))
        .bearer_auth(&author_token)
        .json(&serde_json::json!({ "body": "Mine" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", comment_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", comment_id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn comment_body_html_is_sanitized() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "xss").await;
    let event_id = common::create_test_event(&app, &token, "Sanitized").await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/comments", event_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "body": "<script>alert(1)</script>hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let html = body["data"]["body_html"].as_str().unwrap();
    assert!(!html.contains("<script>"));
    assert!(html.contains("hello"));
}
