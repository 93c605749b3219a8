//! Tests for the personality-test endpoints.

mod common;

use axum::http::StatusCode;
use common::setup;
use serde_json::json;

async fn create_pet(ctx: &common::TestApp, access: &str) -> i64 {
    let (status, pet) = ctx
        .request("POST", "/pets/", Some(json!({ "name": "Rex" })), Some(access))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    pet["id"].as_i64().unwrap()
}

#[tokio::test]
async fn sheet_is_available_without_auth() {
    let ctx = setup().await;

    let (status, body) = ctx.request("GET", "/personality/sheet", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["types"].as_array().unwrap().len(), 8);
    assert!(!body["questions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn scoring_classifies_and_stores_result() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let pet_id = create_pet(&ctx, &access).await;

    let (status, result) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 80,
                "dependenceLeadership": 20,
                "rationalityEmotionality": 20,
            })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Extroverted only: +4 flag.
    assert_eq!(result["type"], "EDR");

    let (status, list) = ctx.request("GET", "/personality/", None, Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn boundary_score_does_not_set_flags() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let pet_id = create_pet(&ctx, &access).await;

    let (_, result) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 50,
                "dependenceLeadership": 50,
                "rationalityEmotionality": 50,
            })),
            Some(&access),
        )
        .await;
    // Exactly 50 means the flag stays unset on every axis.
    assert_eq!(result["type"], "IDR");
}

#[tokio::test]
async fn retest_reclassifies() {
    let ctx = setup().await;
    let (access, _) = ctx.login("alice").await;
    let pet_id = create_pet(&ctx, &access).await;

    let (_, result) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 10,
                "dependenceLeadership": 10,
                "rationalityEmotionality": 10,
            })),
            Some(&access),
        )
        .await;
    let result_id = result["id"].as_i64().unwrap();

    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/personality/{}", result_id),
            Some(json!({
                "introversionExtroversion": 90,
                "dependenceLeadership": 90,
                "rationalityEmotionality": 90,
            })),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "ELE");
}

#[tokio::test]
async fn validation_and_ownership() {
    let ctx = setup().await;
    let (alice, _) = ctx.login("alice").await;
    let (bob, _) = ctx.login("bob").await;
    let pet_id = create_pet(&ctx, &alice).await;

    // Score out of range.
    let (status, _) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 101,
                "dependenceLeadership": 0,
                "rationalityEmotionality": 0,
            })),
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Bob cannot score Alice's pet.
    let (status, _) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 10,
                "dependenceLeadership": 10,
                "rationalityEmotionality": 10,
            })),
            Some(&bob),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob cannot delete Alice's result either.
    let (_, result) = ctx
        .request(
            "POST",
            "/personality/",
            Some(json!({
                "petId": pet_id,
                "introversionExtroversion": 10,
                "dependenceLeadership": 10,
                "rationalityEmotionality": 10,
            })),
            Some(&alice),
        )
        .await;
    let result_id = result["id"].as_i64().unwrap();

    let (status, _) = ctx
        .request("DELETE", &format!("/personality/{}", result_id), None, Some(&bob))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/personality/{}", result_id),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
