//! Tests for the discussion-board endpoints: posts, comments, likes and
//! bookmarks.

mod common;

use axum::http::StatusCode;
use common::setup;
use serde_json::json;

async fn create_post(
    ctx: &common::TestApp,
    access: &str,
    title: &str,
    category_id: i64,
) -> i64 {
    let (status, body) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({
                "title": title,
                "content": "Some thoughts about dogs.",
                "categoryId": category_id,
            })),
            Some(access),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["id"].as_i64().expect("missing post id")
}

#[tokio::test]
async fn categories_are_public_and_seeded() {
    let ctx = setup().await;

    let (status, body) = ctx.request("GET", "/posts/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().expect("expected an array");
    assert_eq!(categories.len(), 5);
    assert_eq!(categories[0]["abbreviation"], "free");
}

#[tokio::test]
async fn create_requires_auth_and_valid_fields() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let (status, _) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({ "title": "t", "content": "c", "categoryId": 1 })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({ "title": "   ", "content": "c", "categoryId": 1 })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request(
            "POST",
            "/posts/",
            Some(json!({ "title": "t", "content": "c", "categoryId": 999 })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detail_includes_author_meta_and_comments() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let post_id = create_post(&ctx, &access, "Park day", 1).await;

    let (_, comment) = ctx
        .request(
            "POST",
            &format!("/posts/{}/comments", post_id),
            Some(json!({ "content": "Looks fun!" })),
            Some(&access),
        )
        .await;
    assert!(comment["id"].as_i64().is_some());

    let (status, body) = ctx
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Park day");
    assert_eq!(body["categoryName"], "Free Board");
    assert_eq!(body["authorNickname"], "alice");
    assert_eq!(body["commentsCount"], 1);
    assert_eq!(body["comments"][0]["content"], "Looks fun!");
}

#[tokio::test]
async fn detail_bumps_view_count() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let post_id = create_post(&ctx, &access, "Views", 1).await;

    ctx.request("GET", &format!("/posts/{}", post_id), None, None).await;
    let (_, body) = ctx
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    // The second read sees the first read's bump.
    assert_eq!(body["views"], 1);
}

#[tokio::test]
async fn listing_paginates_newest_first_with_category_filter() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    for i in 0..7 {
        let category = if i % 2 == 0 { 1 } else { 2 };
        create_post(&ctx, &access, &format!("post {}", i), category).await;
    }

    let (status, body) = ctx.request("GET", "/posts/?page=1&limit=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 7);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["items"][0]["title"], "post 6");

    let (_, body) = ctx
        .request("GET", "/posts/?page=1&limit=5&category=2", None, None)
        .await;
    assert_eq!(body["total"], 3);

    let (status, _) = ctx.request("GET", "/posts/?page=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_is_owner_scoped_and_partial() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;
    let post_id = create_post(&ctx, &alice, "before", 1).await;

    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/posts/{}", post_id),
            Some(json!({ "title": "hijacked" })),
            Some(&bob),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/posts/{}", post_id),
            Some(json!({ "title": "after" })),
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "after");
    assert_eq!(body["content"], "Some thoughts about dogs.");
}

#[tokio::test]
async fn soft_deleted_post_disappears_everywhere() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let post_id = create_post(&ctx, &access, "short-lived", 1).await;

    let (status, _) = ctx
        .request("DELETE", &format!("/posts/{}", post_id), None, Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx.request("GET", "/posts/", None, None).await;
    assert_eq!(body["total"], 0);

    // The row survives as a soft-delete tombstone.
    let row: (i64,) = sqlx::query_as("SELECT is_deleted FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_one(ctx.db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn comments_on_missing_posts_are_rejected() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;

    let (status, _) = ctx
        .request(
            "POST",
            "/posts/999/comments",
            Some(json!({ "content": "hello?" })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_delete_is_owner_scoped() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;
    let post_id = create_post(&ctx, &alice, "commented", 1).await;

    let (_, comment) = ctx
        .request(
            "POST",
            &format!("/posts/{}/comments", post_id),
            Some(json!({ "content": "mine" })),
            Some(&alice),
        )
        .await;
    let comment_id = comment["id"].as_i64().unwrap();

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/posts/comments/{}", comment_id),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/posts/comments/{}", comment_id),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn like_toggles_and_updates_counter() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;
    let post_id = create_post(&ctx, &alice, "likeable", 1).await;

    let (status, body) = ctx
        .request("POST", &format!("/posts/{}/like", post_id), None, Some(&bob))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (_, detail) = ctx
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    assert_eq!(detail["likes"], 1);

    let (_, body) = ctx
        .request("POST", &format!("/posts/{}/like", post_id), None, Some(&bob))
        .await;
    assert_eq!(body["liked"], false);

    let (_, detail) = ctx
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    assert_eq!(detail["likes"], 0);
}

#[tokio::test]
async fn bookmark_toggles() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let post_id = create_post(&ctx, &alice, "keeper", 1).await;

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/posts/{}/bookmark", post_id),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookmarked"], true);

    let (status, _) = ctx
        .request("POST", "/posts/999/bookmark", None, Some(&alice))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
