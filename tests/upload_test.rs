mod common;

use image::GenericImageView;
use serde_json::Value;
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(width, height, image::Rgb([200u8, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn avatar_upload_stores_original_and_thumbnail() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "ava").await;

    let part = reqwest::multipart::Part::bytes(png_bytes(300, 120))
        .file_name("avatar.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = app
        .client
        .post(app.url("/upload/avatar"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let url = body["data"]["url"].as_str().unwrap();
    let thumb_url = body["data"]["thumb_url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/avatars/"));
    assert!(thumb_url.starts_with("/uploads/avatars/thumbs/"));

    // The thumbnail variant on disk is exactly 50x50
    let thumb_path = format!("./test_uploads{}", thumb_url.trim_start_matches("/uploads"));
    let thumb = image::open(&thumb_path).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (50, 50));
}

#[tokio::test]
async fn upload_rejects_mismatched_content_type() {
    let app = common::spawn_app().await;
    let (_id, token, _name) = common::create_test_user(&app, "bad").await;

    // PNG bytes declared as JPEG
    let part = reqwest::multipart::Part::bytes(png_bytes(10, 10))
        .file_name("avatar.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = app
        .client
        .post(app.url("/upload/avatar"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn upload_requires_auth() {
    let app = common::spawn_app().await;

    let part = reqwest::multipart::Part::bytes(png_bytes(10, 10))
        .file_name("avatar.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = app
        .client
        .post(app.url("/upload/avatar"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}
