//! Tests for the stray-animal proxy endpoints against the mock upstream.

mod common;

use axum::http::StatusCode;
use common::setup;

#[tokio::test]
async fn sido_proxies_province_list() {
    let ctx = setup().await;

    let (status, body) = ctx.request("GET", "/shelter/sido", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("expected an array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["orgdownNm"], "Seoul");
}

#[tokio::test]
async fn sigungu_requires_province_code() {
    let ctx = setup().await;

    let (status, body) = ctx
        .request("GET", "/shelter/sigungu?upr_cd=6110000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["orgdownNm"], "Gangnam-gu");

    // Missing query parameter never reaches the upstream.
    let (status, _) = ctx.request("GET", "/shelter/sigungu", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn kind_proxies_breed_codes() {
    let ctx = setup().await;

    let (status, body) = ctx
        .request("GET", "/shelter/kind?up_kind_cd=417000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["knm"], "Border Collie");
}

#[tokio::test]
async fn listings_unwrap_the_upstream_envelope() {
    let ctx = setup().await;

    let (status, body) = ctx
        .request("GET", "/shelter/?upr_cd=6110000&neuter_yn=N", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("expected an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["desertionNo"], "448551202500001");
    assert_eq!(items[0]["careNm"], "Riverside shelter");
    // Envelope fields do not leak through the proxy.
    assert!(body.get("response").is_none());
}
