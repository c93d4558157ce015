mod common;

use serde_json::Value;

#[tokio::test]
async fn profile_exposes_only_the_attribute_path() {
    let app = common::spawn_app().await;
    let (_id, _token, name) = common::create_test_user(&app, "vis").await;

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", name.replace(' ', "%20"))))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = body["data"].as_object().unwrap();

    assert_eq!(data.len(), 3);
    assert!(data.contains_key("name"));
    assert!(data.contains_key("email"));
    assert!(data.contains_key("description"));
    // Nothing sensitive leaks through the generic path
    assert!(!data.contains_key("password_hash"));
    assert!(!data.contains_key("active"));
    assert!(!data.contains_key("sign_in_count"));
}

#[tokio::test]
async fn description_is_name_and_email() {
    let app = common::spawn_app().await;

    app.client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": "ann",
            "email": "ann@x.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();

    let resp = app.client.get(app.url("/users/Ann")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["description"], "Ann (ann@x.com)");
}

#[tokio::test]
async fn unknown_user_profile_is_404() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/users/Nobody%20Here"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn update_profile_renormalizes_email() {
    let app = common::spawn_app().await;
    let (_id, token, name) = common::create_test_user(&app, "eml").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "email": "Changed@Mail.COM" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["email"], "changed@mail.com");
    // Name untouched
    assert_eq!(body["data"]["name"], name);
}

#[tokio::test]
async fn update_profile_clears_email_with_empty_string() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "clr").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "email": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["email"].is_null());
}

#[tokio::test]
async fn update_profile_name_is_validated_but_not_recased() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "ren").await;

    // Too long
    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "seventeen chars!!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // Mixed case survives updates; title-casing is creation-only
    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "mcLeod" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "mcLeod");
}

#[tokio::test]
async fn update_profile_rejects_taken_name() {
    let app = common::spawn_app().await;
    let (_id1, _token1, taken) = common::create_test_user(&app, "one").await;
    let (_id2, token2, _name2) = common::create_test_user(&app, "two").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token2)
        .json(&serde_json::json!({ "name": taken }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["name"][0], "has already been taken");
}

#[tokio::test]
async fn update_profile_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .json(&serde_json::json!({ "email": "x@y.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn user_events_view_lists_owned_events() {
    let app = common::spawn_app().await;
    let (_id, token, name) = common::create_test_user(&app, "own").await;

    common::create_test_event(&app, &token, "Picnic").await;
    common::create_test_event(&app, &token, "Cleanup").await;

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/events", name.replace(' ', "%20"))))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn user_items_view_is_distinct_across_events() {
    let app = common::spawn_app().await;
    let (_id, token, name) = common::create_test_user(&app, "itm").await;

    let event_a = common::create_test_event(&app, &token, "BBQ").await;
    let event_b = common::create_test_event(&app, &token, "Hike").await;

    for (event_id, item) in [(event_a, "rope"), (event_a, "tent"), (event_b, "rope")] {
        let resp = app
            .client
            .post(app.url(&format!("/events/{}/items", event_id)))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "name": item }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .get(app.url(&format!("/users/{}/items", name.replace(' ', "%20"))))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // Three item rows exist; they are distinct rows even when names repeat
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}
