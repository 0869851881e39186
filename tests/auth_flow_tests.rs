//! End-to-end login and authorization flows against the in-process router

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use tower::ServiceExt;

use questline_server::auth::{AuthService, ChallengeService, NonceRegistry, TokenService};
use questline_server::clock::ManualClock;
use questline_server::routes::app_router;
use questline_server::state::AppState;
use questline_server::store::{InMemoryUserStore, UserStore};

struct TestApp {
    router: Router,
    store: Arc<InMemoryUserStore>,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(InMemoryUserStore::new());
        let registry = Arc::new(NonceRegistry::new(Duration::minutes(5), clock.clone()));
        let auth_service = Arc::new(AuthService::new(
            ChallengeService::new(registry, "Questline"),
            TokenService::new("integration-secret", Duration::hours(24), clock.clone()),
            store.clone(),
            clock.clone(),
        ));

        let router = app_router(AppState::new(auth_service, store.clone()));

        Self {
            router,
            store,
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn request_nonce(&self, wallet_address: &str) -> (StatusCode, Value) {
        self.get(&format!("/auth/nonce?walletAddress={}", wallet_address), None)
            .await
    }

    async fn login(&self, wallet_address: &str, signature: &str) -> (StatusCode, Value) {
        self.send_json(
            Method::POST,
            "/auth/login",
            None,
            json!({ "walletAddress": wallet_address, "signature": signature }),
        )
        .await
    }

    /// Full happy-path login, returning the token and user JSON
    async fn login_as(&self, wallet: &TestWallet) -> (String, Value) {
        let (status, challenge) = self.request_nonce(&wallet.address()).await;
        assert_eq!(status, StatusCode::OK);

        let signature = wallet.sign(challenge["message"].as_str().unwrap());
        let (status, body) = self.login(&wallet.address(), &signature).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        (body["token"].as_str().unwrap().to_string(), body["user"].clone())
    }
}

struct TestWallet {
    key: SigningKey,
}

impl TestWallet {
    fn new() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    fn address(&self) -> String {
        bs58::encode(self.key.verifying_key().as_bytes()).into_string()
    }

    fn sign(&self, message: &str) -> String {
        bs58::encode(self.key.sign(message.as_bytes()).to_bytes()).into_string()
    }
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_nonce_requires_wallet_address() {
    let app = TestApp::new();

    let (status, _) = app.get("/auth/nonce", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nonce_response_carries_signable_message() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (status, body) = app.request_nonce(&wallet.address()).await;
    assert_eq!(status, StatusCode::OK);

    let nonce = body["nonce"].as_str().unwrap();
    assert_eq!(
        body["message"],
        format!("Sign this message to authenticate with Questline: {}", nonce)
    );
    assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn test_scenario_a_login_lowercases_wallet() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (token, user) = app.login_as(&wallet).await;

    assert!(!token.is_empty());
    assert_eq!(user["walletAddress"], wallet.address().to_lowercase());
    assert_eq!(user["points"], 0);
    assert!(user["username"].as_str().unwrap().starts_with("user_"));
    assert_eq!(user["referralCode"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_scenario_b_replay_is_rejected() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (_, challenge) = app.request_nonce(&wallet.address()).await;
    let signature = wallet.sign(challenge["message"].as_str().unwrap());

    let (status, _) = app.login(&wallet.address(), &signature).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.login(&wallet.address(), &signature).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("no nonce found"));
}

#[tokio::test]
async fn test_scenario_c_expired_nonce() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (_, challenge) = app.request_nonce(&wallet.address()).await;
    let signature = wallet.sign(challenge["message"].as_str().unwrap());

    app.clock.advance(Duration::minutes(5) + Duration::seconds(1));

    let (status, body) = app.login(&wallet.address(), &signature).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("nonce expired"));
}

#[tokio::test]
async fn test_scenario_d_non_admin_is_forbidden() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (token, user) = app.login_as(&wallet).await;
    let uri = format!("/admin/users/{}", user["id"].as_str().unwrap());

    let (status, body) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(error_message(&body).contains("admin access required"));
}

#[tokio::test]
async fn test_admin_can_use_admin_route() {
    let app = TestApp::new();
    let admin_wallet = TestWallet::new();
    let player_wallet = TestWallet::new();

    let (admin_token, admin_user) = app.login_as(&admin_wallet).await;
    let (_, player) = app.login_as(&player_wallet).await;

    let admin_id = admin_user["id"].as_str().unwrap().parse().unwrap();
    let mut stored = app.store.find_by_id(admin_id).await.unwrap().unwrap();
    stored.is_admin = true;
    app.store.save(&stored).await.unwrap();

    let uri = format!("/admin/users/{}", player["id"].as_str().unwrap());
    let (status, body) = app.get(&uri, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["walletAddress"], player["walletAddress"]);

    let missing = format!("/admin/users/{}", uuid::Uuid::new_v4());
    let (status, _) = app.get(&missing, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let (status, _) = app
        .send_json(
            Method::POST,
            "/auth/login",
            None,
            json!({ "walletAddress": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(Method::POST, "/auth/login", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(
            Method::POST,
            "/auth/login",
            None,
            json!({ "walletAddress": 5, "signature": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .body(Body::from(r#"{"walletAddress":"abc","signature":"x"}"#))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (token, _) = app.login_as(&TestWallet::new()).await;
    let (status, body) = app
        .send_json(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            json!({ "username": ["not", "a", "string"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_without_nonce() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (status, body) = app.login(&wallet.address(), &wallet.sign("whatever")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("no nonce found"));
}

#[tokio::test]
async fn test_invalid_signature_is_unauthorized_and_retryable() {
    let app = TestApp::new();
    let wallet = TestWallet::new();
    let imposter = TestWallet::new();

    let (_, challenge) = app.request_nonce(&wallet.address()).await;
    let message = challenge["message"].as_str().unwrap();

    let (status, body) = app.login(&wallet.address(), &imposter.sign(message)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(error_message(&body).contains("invalid signature"));

    let (status, _) = app.login(&wallet.address(), "not*base58").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.login(&wallet.address(), &wallet.sign(message)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_newer_nonce_invalidates_older_signature() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (_, first) = app.request_nonce(&wallet.address()).await;
    let stale_signature = wallet.sign(first["message"].as_str().unwrap());
    let (_, second) = app.request_nonce(&wallet.address()).await;
    assert_ne!(first["nonce"], second["nonce"]);

    let (status, _) = app.login(&wallet.address(), &stale_signature).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .login(
            &wallet.address(),
            &wallet.sign(second["message"].as_str().unwrap()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeat_logins_share_one_principal() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (_, first) = app.login_as(&wallet).await;
    let (_, second) = app.login_as(&wallet).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_profile_requires_valid_token() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (status, body) = app.get("/auth/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");

    let (token, user) = app.login_as(&wallet).await;

    let (status, body) = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user["id"]);

    // Flip one character in the payload segment
    let dot = token.find('.').unwrap();
    let mut bytes = token.clone().into_bytes();
    bytes[dot + 3] = if bytes[dot + 3] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(bytes).unwrap();

    let (status, body) = app.get("/auth/profile", Some(&tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_expired_session_is_unauthorized() {
    let app = TestApp::new();
    let wallet = TestWallet::new();

    let (token, _) = app.login_as(&wallet).await;
    app.clock.advance(Duration::hours(24) + Duration::seconds(1));

    let (status, body) = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let (token, _) = app.login_as(&TestWallet::new()).await;
    let (_, other) = app.login_as(&TestWallet::new()).await;

    let (status, body) = app
        .send_json(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            json!({ "username": "quest_hero", "avatar": "https://cdn.example.com/hero.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "quest_hero");
    assert_eq!(body["avatar"], "https://cdn.example.com/hero.png");

    let (status, _) = app
        .send_json(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            json!({ "username": other["username"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            Method::PUT,
            "/auth/profile",
            Some(&token),
            json!({ "username": "bad name!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            Method::PUT,
            "/auth/profile",
            None,
            json!({ "username": "quest_hero" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
