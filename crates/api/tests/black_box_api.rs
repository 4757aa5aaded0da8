use chrono::{Duration as ChronoDuration, Utc};
use gatehouse_api::app::{self, AppServices};
use gatehouse_auth::{Claims, RbacPolicy, RbacRegistry, Role, TokenClass, TokenConfig, TokenManager};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

const ACCESS_SECRET: &str = "black-box-access-secret-0123456789abcdef";
const REFRESH_SECRET: &str = "black-box-refresh-secret-0123456789abcdef";

const POLICY: &str = r#"{
    "roles": [
        { "name": "admin", "permissions": ["document:*", "rbac:read"] },
        { "name": "user", "permissions": ["document:read", "document:list"] },
        { "name": "guest", "parents": ["user"] }
    ]
}"#;

struct TestServer {
    base_url: String,
    tokens: TokenManager,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = TokenConfig::new(ACCESS_SECRET, REFRESH_SECRET);
        let policy = RbacPolicy::from_json_str(POLICY).unwrap();
        let rbac = RbacRegistry::from_policy(&policy).unwrap();

        let app = app::build_app(AppServices::new(
            TokenManager::new(config.clone()).unwrap(),
            rbac,
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            tokens: TokenManager::new(config).unwrap(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn access_token(&self, roles: &[&str]) -> String {
        let roles = roles.iter().map(|r| Role::new(r.to_string())).collect();
        self.tokens.generate_access_token("user-1", roles).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn error_message(res: reqwest::Response) -> String {
    let body: serde_json::Value = res.json().await.unwrap();
    body["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_or_garbled_bearer_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(res).await, "missing bearer token");

    let res = client
        .get(server.url("/whoami"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(res).await, "invalid token");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let server = TestServer::spawn().await;
    let refresh = server.tokens.generate_refresh_token("user-1").unwrap();

    let res = reqwest::Client::new()
        .get(server.url("/whoami"))
        .bearer_auth(refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(res).await, "invalid token");
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let server = TestServer::spawn().await;
    let issued = Utc::now() - ChronoDuration::hours(2);
    let token = server
        .tokens
        .generate_access_token_at("user-1", vec![Role::new("admin")], issued)
        .unwrap();

    let res = reqwest::Client::new()
        .get(server.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(res).await, "token expired");
}

#[tokio::test]
async fn token_signed_with_foreign_secret_is_rejected() {
    let server = TestServer::spawn().await;
    let now = Utc::now();
    let claims = Claims::new(
        "intruder",
        vec![Role::new("admin")],
        TokenClass::Access,
        now,
        ChronoDuration::minutes(10),
    )
    .unwrap();
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret-entirely-0123456789"),
    )
    .unwrap();

    let res = reqwest::Client::new()
        .get(server.url("/documents"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_echoes_token_identity() {
    let server = TestServer::spawn().await;
    let token = server.access_token(&["guest"]);

    let res = reqwest::Client::new()
        .get(server.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "user_id": "user-1", "roles": ["guest"] }));
}

#[tokio::test]
async fn inherited_permission_allows_and_missing_permission_forbids() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let guest = server.access_token(&["guest"]);

    let res = client
        .get(server.url("/documents"))
        .bearer_auth(&guest)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(server.url("/documents/readme"))
        .bearer_auth(&guest)
        .json(&json!({ "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "forbidden: missing permission 'document:write'");
}

#[tokio::test]
async fn wildcard_admin_manages_documents() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = server.access_token(&["admin"]);
    let user = server.access_token(&["user"]);

    let res = client
        .put(server.url("/documents/readme"))
        .bearer_auth(&admin)
        .json(&json!({ "body": "v1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .put(server.url("/documents/readme"))
        .bearer_auth(&admin)
        .json(&json!({ "body": "v2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url("/documents/readme"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": "readme", "body": "v2" }));

    let res = client
        .delete(server.url("/documents/readme"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url("/documents/readme"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url("/documents/readme"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explain_reports_inherited_grant() {
    let server = TestServer::spawn().await;
    let guest = server.access_token(&["guest"]);

    let res = reqwest::Client::new()
        .get(server.url("/rbac/explain?resource=document&action=read"))
        .bearer_auth(guest)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["granted"], true);
    assert_eq!(body["grant"]["held_role"], "guest");
    assert_eq!(body["grant"]["source_role"], "user");
    assert_eq!(body["grant"]["permission"], "document:read");
}

#[tokio::test]
async fn role_audit_requires_rbac_read() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/rbac/roles"))
        .bearer_auth(server.access_token(&["user"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = server.access_token(&["admin"]);
    let res = client
        .get(server.url("/rbac/roles"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "roles": ["admin", "guest", "user"] }));

    let res = client
        .get(server.url("/rbac/roles/guest"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["parents"], json!(["user"]));
    assert_eq!(body["permissions"], json!([]));
    assert_eq!(
        body["effective_permissions"],
        json!(["document:list", "document:read"])
    );

    let res = client
        .get(server.url("/rbac/roles/nobody"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
