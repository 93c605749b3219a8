#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::{Form, Query},
    http::{HeaderMap, Request, StatusCode, header},
    routing::{get, post},
};
use pawhub::kakao::KakaoConfig;
use pawhub::shelter::ShelterConfig;
use pawhub::{ServerConfig, create_app, db::Database};
use serde_json::{Value, json};
use std::collections::HashMap;
use tower::ServiceExt;
use url::Url;

/// In-process application plus the mock upstream servers it talks to.
pub struct TestApp {
    pub app: Router,
    pub db: Database,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Mock identity provider.
///
/// Token endpoint: exchanges code `X` for provider token `tok-X`.
/// Userinfo endpoint: `tok-X` resolves to `X@example.com` with nickname `X`;
/// anything else is rejected with 401.
fn mock_kakao_router() -> Router {
    #[derive(serde::Deserialize)]
    struct TokenForm {
        grant_type: String,
        code: String,
    }

    async fn token(Form(form): Form<TokenForm>) -> Result<Json<Value>, StatusCode> {
        if form.grant_type != "authorization_code" {
            return Err(StatusCode::BAD_REQUEST);
        }
        if form.code == "bad-code" {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(json!({
            "access_token": format!("tok-{}", form.code),
            "token_type": "bearer",
            "expires_in": 21599,
        })))
    }

    async fn userinfo(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let name = bearer.strip_prefix("tok-").ok_or(StatusCode::UNAUTHORIZED)?;
        if name.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if name == "no-email" {
            // A consented-out account: profile without email.
            return Ok(Json(json!({
                "id": 1,
                "kakao_account": { "profile": { "nickname": "ghost" } }
            })));
        }
        Ok(Json(json!({
            "id": 1001,
            "kakao_account": {
                "email": format!("{}@example.com", name),
                "profile": { "nickname": name },
                "gender": "female",
                "age_range": "20~29",
            }
        })))
    }

    Router::new()
        .route("/oauth/token", post(token))
        .route("/v2/user/me", get(userinfo))
}

/// Mock public shelter API with canned envelope payloads.
fn mock_shelter_router() -> Router {
    fn envelope(items: Value) -> Json<Value> {
        Json(json!({
            "response": {
                "header": { "reqNo": 1, "resultCode": "00", "resultMsg": "NORMAL SERVICE." },
                "body": { "items": { "item": items }, "numOfRows": 10, "pageNo": 1, "totalCount": 1 }
            }
        }))
    }

    fn check_key(query: &HashMap<String, String>) -> Result<(), StatusCode> {
        if query.get("serviceKey").map(String::as_str) != Some("test-service-key") {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(())
    }

    async fn sido(Query(query): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        check_key(&query)?;
        Ok(envelope(json!([
            { "orgCd": "6110000", "orgdownNm": "Seoul" },
            { "orgCd": "6260000", "orgdownNm": "Busan" }
        ])))
    }

    async fn sigungu(
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        check_key(&query)?;
        if query.get("upr_cd").is_none() {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(envelope(json!([
            { "uprCd": "6110000", "orgCd": "3220000", "orgdownNm": "Gangnam-gu" }
        ])))
    }

    async fn kind(Query(query): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        check_key(&query)?;
        Ok(envelope(json!([
            { "kindCd": "000054", "knm": "Border Collie" }
        ])))
    }

    async fn listings(
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        check_key(&query)?;
        // The proxy pins the dog upkind code.
        if query.get("upkind").map(String::as_str) != Some("417000") {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(envelope(json!([{
            "desertionNo": "448551202500001",
            "filename": "thumb.jpg",
            "happenDt": "20250801",
            "happenPlace": "Riverside park",
            "kindCd": "[Dog] Mixed",
            "colorCd": "Brown",
            "age": "2024(Year)",
            "weight": "7(Kg)",
            "noticeNo": "Seoul-2025-00001",
            "noticeSdt": "20250801",
            "noticeEdt": "20250811",
            "popfile": "full.jpg",
            "processState": "protecting",
            "sexCd": "M",
            "neuterYn": "N",
            "specialMark": "Friendly, found with collar",
            "careNm": "Riverside shelter",
            "careTel": "02-000-0000",
            "careAddr": "1 Shelter road",
            "orgNm": "Seoul",
            "chargeNm": "Kim",
            "officetel": "02-111-1111"
        }])))
    }

    Router::new()
        .route("/sido", get(sido))
        .route("/sigungu", get(sigungu))
        .route("/kind", get(kind))
        .route("/abandonmentPublic", get(listings))
}

async fn spawn_mock(router: Router) -> (tokio::task::JoinHandle<()>, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Failed to get local address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    (handle, format!("http://{}", addr))
}

pub async fn setup() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");

    let (kakao_handle, kakao_base) = spawn_mock(mock_kakao_router()).await;
    let (shelter_handle, shelter_base) = spawn_mock(mock_shelter_router()).await;

    let media_root = std::env::temp_dir().join(format!(
        "pawhub-test-media-{}-{}",
        std::process::id(),
        uuid::Uuid::new_v4()
    ));

    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: b"test-jwt-secret-for-integration-tests".to_vec(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 3600,
        kakao: KakaoConfig {
            client_id: "test-client".to_string(),
            redirect_uri: "http://localhost/callback".to_string(),
            token_url: Url::parse(&format!("{}/oauth/token", kakao_base)).expect("Invalid URL"),
            userinfo_url: Url::parse(&format!("{}/v2/user/me", kakao_base)).expect("Invalid URL"),
        },
        shelter: ShelterConfig {
            base_url: Url::parse(&shelter_base).expect("Invalid URL"),
            service_key: "test-service-key".to_string(),
        },
        media_root,
        media_public_base: "/media".to_string(),
    };

    TestApp {
        app: create_app(&config),
        db,
        handles: vec![kakao_handle, shelter_handle],
    }
}

impl TestApp {
    /// Send a request through the router and return (status, parsed body).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Send a request with an arbitrary content type and raw body.
    pub async fn request_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: &str,
        body: Vec<u8>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body)).expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Log in through the mock provider; `name` controls the identity
    /// (`{name}@example.com`). Returns (access_token, refresh_token).
    pub async fn login(&self, name: &str) -> (String, String) {
        let (status, body) = self
            .request("GET", &format!("/auth/kakao/code?code={}", name), None, None)
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        (
            body["accessToken"]
                .as_str()
                .expect("missing accessToken")
                .to_string(),
            body["refreshToken"]
                .as_str()
                .expect("missing refreshToken")
                .to_string(),
        )
    }

    /// Log in with an explicit User-Agent header.
    pub async fn login_with_device(&self, name: &str, user_agent: &str) -> (String, String) {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/auth/kakao/code?code={}", name))
            .header(header::USER_AGENT, user_agent)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).expect("Invalid JSON");
        (
            body["accessToken"].as_str().unwrap().to_string(),
            body["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    /// Account id for a logged-in identity.
    pub async fn account_id(&self, name: &str) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT id FROM accounts WHERE email = ?")
            .bind(format!("{}@example.com", name))
            .fetch_one(self.db.pool())
            .await
            .expect("account not found");
        row.0
    }

    /// Force a session's expiry to an arbitrary instant (raw SQL backdate).
    pub async fn set_session_expiry(&self, token: &str, expires_at: i64) {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(expires_at)
            .bind(token)
            .execute(self.db.pool())
            .await
            .expect("Failed to update session expiry");
    }
}
