mod common;

use serde_json::Value;

#[tokio::test]
async fn create_and_get_event() {
    let app = common::spawn_app().await;
    let (user_id, token, _name) = common::create_test_user(&app, "evt").await;

    let resp = app
        .client
        .post(app.url("/events"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Spring Picnic",
            "description": "Bring **snacks**",
            "location": "Riverside park",
            "starts_at": "2026-09-01T12:00:00"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let event_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["user_id"].as_i64().unwrap() as i32, user_id);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Spring Picnic");
    assert!(body["data"]["description_html"]
        .as_str()
        .unwrap()
        .contains("<strong>snacks</strong>"));
}

#[tokio::test]
async fn create_event_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/events"))
        .json(&serde_json::json!({
            "title": "Anonymous",
            "description": "nope"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn listing_is_paginated() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "pag").await;

    for i in 1..=5 {
        common::create_test_event(&app, &token, &format!("Event {}", i)).await;
    }

    let resp = app
        .client
        .get(app.url("/events?page=1&per_page=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"].as_u64().unwrap(), 5);
    assert_eq!(body["data"]["total_pages"].as_u64().unwrap(), 3);
}

#[tokio::test]
async fn only_the_owner_can_update_or_delete() {
    let app = common::spawn_app().await;
    let (_id1, owner_token, _n1) = common::create_test_user(&app, "owr").await;
    let (_id2, other_token, _n2) = common::create_test_user(&app, "oth").await;

    let event_id = common::create_test_event(&app, &owner_token, "Private").await;

    let resp = app
        .client
        .put(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({
            "title": "Hijacked",
            "description": "x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn items_follow_their_event() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "iev").await;

    let event_id = common::create_test_event(&app, &token, "Packing").await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/items", event_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "stove", "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let item_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["quantity"].as_i64().unwrap(), 2);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}/items", event_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = app
        .client
        .delete(app.url(&format!("/events/{}/items/{}", event_id, item_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}/items", event_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn zero_quantity_item_is_rejected() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "qty").await;

    let event_id = common::create_test_event(&app, &token, "Counting").await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/items", event_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "nothing", "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn about_page_is_public() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/about")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "eventbook");
}
