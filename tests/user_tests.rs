//! Tests for the current-user endpoints: profile, own content listings,
//! and the profile image.

mod common;

use axum::http::StatusCode;
use common::setup;
use serde_json::json;

fn multipart_image(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn me_returns_account_with_profile() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let (status, body) = ctx.request("GET", "/user/me", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["nickname"], "alice");
    assert_eq!(body["gender"], "female");
    assert_eq!(body["imageUrl"], serde_json::Value::Null);
    assert!(body["registeredAt"].as_str().is_some());
}

#[tokio::test]
async fn nickname_update() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let (status, body) = ctx
        .request(
            "PUT",
            "/user/me",
            Some(json!({ "nickname": "dogmother" })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nickname"], "dogmother");

    let (status, _) = ctx
        .request("PUT", "/user/me", Some(json!({ "nickname": " " })), Some(&access))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn my_posts_and_activity() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;

    let (_, post) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({ "title": "mine", "content": "c", "categoryId": 1 })),
            Some(&alice),
        )
        .await;
    let post_id = post["id"].as_i64().unwrap();
    ctx.request(
        "POST",
        "/posts/",
        Some(json!({ "title": "bobs", "content": "c", "categoryId": 1 })),
        Some(&bob),
    )
    .await;
    ctx.request(
        "POST",
        &format!("/posts/{}/comments", post_id),
        Some(json!({ "content": "nice" })),
        Some(&alice),
    )
    .await;
    ctx.request("POST", &format!("/posts/{}/like", post_id), None, Some(&alice))
        .await;

    let (status, body) = ctx.request("GET", "/user/me/posts", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "mine");

    let (status, body) = ctx
        .request("GET", "/user/me/activity", None, Some(&alice))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"], 1);
    assert_eq!(body["comments"], 1);
    assert_eq!(body["likes"], 1);
}

#[tokio::test]
async fn my_pets_and_bookmarks() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;

    ctx.request("POST", "/pets/", Some(json!({ "name": "Rex" })), Some(&alice))
        .await;

    let (_, post) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({ "title": "bobs", "content": "c", "categoryId": 1 })),
            Some(&bob),
        )
        .await;
    let post_id = post["id"].as_i64().unwrap();
    ctx.request(
        "POST",
        &format!("/posts/{}/bookmark", post_id),
        None,
        Some(&alice),
    )
    .await;

    let (status, body) = ctx.request("GET", "/user/me/pets", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .request("GET", "/user/me/bookmarks", None, Some(&alice))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "bobs");
}

#[tokio::test]
async fn profile_image_upload_and_delete() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let boundary = "pawhub-test-boundary";
    let body = multipart_image(boundary, "avatar.png", "image/png", b"not-really-a-png");

    let (status, profile) = ctx
        .request_raw(
            "POST",
            "/user/me/profile-image",
            &format!("multipart/form-data; boundary={}", boundary),
            body,
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", profile);
    let url = profile["imageUrl"].as_str().expect("missing imageUrl");
    assert!(url.starts_with("/media/profile-images/"));
    assert!(url.ends_with(".png"));

    let (status, profile) = ctx
        .request("DELETE", "/user/me/profile-image", None, Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["imageUrl"], serde_json::Value::Null);
}

#[tokio::test]
async fn profile_image_rejects_non_images() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let boundary = "pawhub-test-boundary";

    // Wrong content type.
    let body = multipart_image(boundary, "notes.txt", "text/plain", b"hello");
    let (status, _) = ctx
        .request_raw(
            "POST",
            "/user/me/profile-image",
            &format!("multipart/form-data; boundary={}", boundary),
            body,
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Image content type but disallowed extension.
    let body = multipart_image(boundary, "avatar.webp", "image/webp", b"data");
    let (status, _) = ctx
        .request_raw(
            "POST",
            "/user/me/profile-image",
            &format!("multipart/form-data; boundary={}", boundary),
            body,
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing field entirely.
    let (status, _) = ctx
        .request_raw(
            "POST",
            "/user/me/profile-image",
            &format!("multipart/form-data; boundary={}", boundary),
            format!("--{boundary}--\r\n").into_bytes(),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
