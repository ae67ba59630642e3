use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use minibill_api::{AppConfig, Mode};
use minibill_auth::{PermissionLevel, SigningSecret, TokenClaims};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";
const ADMIN_PASSWORD: &str = "admin-pass";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(mode: Mode) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let mut config = AppConfig::new(mode, SigningSecret::new(JWT_SECRET));
        config.admin_password = Some(ADMIN_PASSWORD.to_string());
        let app = minibill_api::build_app(&config).expect("failed to build app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(account: &str, level: i32, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: account.to_string(),
        permission_level: PermissionLevel::new(level),
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + expires_in,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn sign_up(client: &reqwest::Client, srv: &TestServer, account: &str) {
    let res = client
        .post(srv.url("/auth/signup"))
        .json(&json!({
            "account": account,
            "name": format!("{account} tester"),
            "email": format!("{account}@example.com"),
            "password": "1234",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn sign_in(client: &reqwest::Client, srv: &TestServer, account: &str, password: &str) -> String {
    let res = client
        .post(srv.url("/auth/signin"))
        .json(&json!({ "account": account, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn user_id(client: &reqwest::Client, srv: &TestServer, token: &str) -> String {
    let body: Value = client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["user"]["id"].as_str().unwrap().to_string()
}

async fn create_catalog_item(client: &reqwest::Client, srv: &TestServer, admin: &str) -> String {
    let res = client
        .post(srv.url("/catalog"))
        .bearer_auth(admin)
        .json(&json!({ "name": "Hosting", "description": "Monthly hosting", "price": 2500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn public_endpoints_need_no_token() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api-docs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let docs: Value = res.json().await.unwrap();
    assert!(docs["routes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["path"] == "/auth/signin" && r["level"].is_null()));
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/catalog", "/transactions/my", "/users"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn sign_up_then_sign_in_returns_token_for_account() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    sign_up(&client, &srv, "alice").await;
    let token = sign_in(&client, &srv, "alice", "1234").await;

    let decoded = jsonwebtoken::decode::<Value>(
        &token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();
    assert_eq!(decoded.claims["sub"], "alice");
    assert_eq!(decoded.claims["permissionLevel"], 0);

    let res = client.get(srv.url("/whoami")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["account"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_and_duplicate_account_are_rejected() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();
    sign_up(&client, &srv, "alice").await;

    let res = client
        .post(srv.url("/auth/signin"))
        .json(&json!({ "account": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = client
        .post(srv.url("/auth/signup"))
        .json(&json!({
            "account": "alice",
            "name": "Another Alice",
            "email": "another@example.com",
            "password": "1234",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn transactions_for_other_users_require_superuser() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();
    let admin = sign_in(&client, &srv, "admin", ADMIN_PASSWORD).await;
    let item_id = create_catalog_item(&client, &srv, &admin).await;

    sign_up(&client, &srv, "alice").await;
    sign_up(&client, &srv, "bob").await;
    let alice = sign_in(&client, &srv, "alice", "1234").await;
    let bob = sign_in(&client, &srv, "bob", "1234").await;
    let alice_id = user_id(&client, &srv, &alice).await;

    // Bob billing Alice.
    let res = client
        .post(srv.url(&format!("/transactions?catalogId={item_id}&amount=100&userId={alice_id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Alice billing herself.
    let res = client
        .post(srv.url(&format!("/transactions?catalogId={item_id}&amount=100")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let tx: Value = res.json().await.unwrap();
    let tx_id = tx["id"].as_str().unwrap().to_string();
    assert_eq!(tx["is_paid"], false);
    assert_eq!(tx["account"], "alice");

    let res = client
        .get(srv.url(&format!("/transactions/{tx_id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url(&format!("/transactions/{tx_id}?isPaid=true")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["is_paid"], true);

    // Admin billing Alice.
    let res = client
        .post(srv.url(&format!("/transactions?catalogId={item_id}&amount=250&userId={alice_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let mine: Value = client
        .get(srv.url("/transactions/my"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let res = client.get(srv.url("/transactions/my")).bearer_auth(&bob).send().await.unwrap();
    let theirs: Value = res.json().await.unwrap();
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn guard_compares_levels() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    let mid = mint_jwt("carol", 50, ChronoDuration::minutes(10));
    let res = client.get(srv.url("/permissions")).bearer_auth(&mid).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let root = mint_jwt("root", 99, ChronoDuration::minutes(10));
    let res = client.get(srv.url("/permissions")).bearer_auth(&root).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Level 50 still clears the level-0 routes.
    let res = client.get(srv.url("/catalog")).bearer_auth(&mid).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_or_forged_tokens_are_anonymous() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    let expired = mint_jwt("root", 99, ChronoDuration::seconds(-5));
    let res = client.get(srv.url("/whoami")).bearer_auth(&expired).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/whoami")).bearer_auth("not.a.jwt").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A bad token never blocks the public routes.
    let res = client
        .post(srv.url("/auth/signin"))
        .bearer_auth("not.a.jwt")
        .json(&json!({ "account": "admin", "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn permission_assignment_lifecycle() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();
    let admin = sign_in(&client, &srv, "admin", ADMIN_PASSWORD).await;
    let admin_id = user_id(&client, &srv, &admin).await;

    sign_up(&client, &srv, "bob").await;
    let bob = sign_in(&client, &srv, "bob", "1234").await;
    let bob_id = user_id(&client, &srv, &bob).await;

    for level in [10, 20] {
        let res = client
            .post(srv.url(&format!("/permissions?level={level}")))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    let res = client
        .post(srv.url("/permissions?level=10"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url(&format!("/users/{bob_id}/permissions?level=10")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .put(srv.url(&format!("/users/{bob_id}/permissions?level=20")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let held: Value = client
        .get(srv.url(&format!("/users/{bob_id}/permissions")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(held["permission"]["level"], 20);

    let bob = sign_in(&client, &srv, "bob", "1234").await;
    let whoami: Value = client
        .get(srv.url("/whoami"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(whoami["permission_level"], 20);

    // Nobody edits their own assignment, superuser included.
    let res = client
        .put(srv.url(&format!("/users/{admin_id}/permissions?level=0")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = client
        .delete(srv.url(&format!("/users/{admin_id}/permissions")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/users/not-a-uuid/permissions"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn held_permission_record_cannot_be_edited_or_deleted() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();
    let admin = sign_in(&client, &srv, "admin", ADMIN_PASSWORD).await;

    let permissions: Value = client
        .get(srv.url("/permissions"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let p99 = permissions
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["level"] == 99)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .put(srv.url(&format!("/permissions/{p99}?level=0")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = client
        .delete(srv.url(&format!("/permissions/{p99}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = sign_in(&client, &srv, "admin", ADMIN_PASSWORD).await;
    let whoami: Value = client
        .get(srv.url("/whoami"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(whoami["permission_level"], 99);

    // Records nobody in particular holds stay editable.
    let created: Value = client
        .post(srv.url("/permissions?level=30"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let p30 = created["id"].as_str().unwrap().to_string();
    let res = client
        .put(srv.url(&format!("/permissions/{p30}?level=31")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .delete(srv.url(&format!("/permissions/{p30}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn development_mode_bootstraps_missing_credentials_only() {
    let srv = TestServer::spawn(Mode::Development).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["account"], "admin");
    assert_eq!(body["permission_level"], 99);

    let res = client.get(srv.url("/whoami")).bearer_auth("garbage").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn production_mode_never_bootstraps() {
    let srv = TestServer::spawn(Mode::Production).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/permissions")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
