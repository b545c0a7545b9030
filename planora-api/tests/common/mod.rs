//! Common test utilities for integration tests
//!
//! - A full router over the in-memory store
//! - A scripted identity provider standing in for Google
//! - Request/response helpers for driving the router with `oneshot`
//! - Session token minting for crafted identities

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::Duration;
use planora_api::{
    app::{build_router, AppState},
    config::Config,
};
use planora_shared::{
    auth::{
        identity::{AuthenticatedIdentity, IdentitySource},
        jwt::{TokenSigner, TokenType},
        secret::unusable_password,
    },
    models::user::{CreateUser, Role},
    oauth::{IdentityProvider, OAuthError, ProviderProfile},
    store::{DynStore, MemoryStore, UserStore},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-secret-key-at-least-32-bytes";
pub const ADMIN_SECRET: &str = "let-me-administer";
pub const POST_LOGIN_REDIRECT: &str = "/dashboard";

/// Identity provider that answers from a fixed code -> profile table
pub struct ScriptedProvider {
    profiles: HashMap<String, ProviderProfile>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn with_profile(mut self, code: &str, email: &str, name: &str) -> Self {
        self.profiles.insert(
            code.to_string(),
            ProviderProfile {
                email: email.to_string(),
                email_verified: true,
                name: Some(name.to_string()),
                picture: None,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn authorize_url(&self, state: &str) -> Result<Url, OAuthError> {
        let mut url = Url::parse("https://idp.test/authorize")
            .map_err(|e| OAuthError::Misconfigured(e.to_string()))?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    async fn exchange(&self, code: &str) -> Result<ProviderProfile, OAuthError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| OAuthError::Exchange(format!("unknown code {}", code)))
    }
}

/// Router plus handles on its store and signer
pub struct TestApp {
    pub app: Router,
    pub store: DynStore,

    /// Same store as `store`, for seeding that has no HTTP surface
    pub memory: Arc<MemoryStore>,

    pub tokens: TokenSigner,
}

/// Response with the body decoded as JSON (`Value::Null` when empty or not JSON)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// Value of the `Set-Cookie` for `name`, if any
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies().into_iter().find_map(|c| {
            c.split(';')
                .next()
                .and_then(|pair| pair.strip_prefix(&prefix))
                .map(String::from)
        })
    }

    /// True when a `Set-Cookie` expires `name`
    pub fn clears_cookie(&self, name: &str) -> bool {
        let prefix = format!("{}=", name);
        self.set_cookies()
            .iter()
            .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
    }

    pub fn location(&self) -> Option<String> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }
}

/// Builder for a single request
pub struct TestRequest {
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: &'static str, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new("GET", uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new("POST", uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new("PUT", uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new("DELETE", uri)
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(format!("{}={}", name, value));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !self.cookies.is_empty() {
            builder = builder.header(header::COOKIE, self.cookies.join("; "));
        }

        match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}

impl TestApp {
    /// Default app: admin secret configured, scripted provider with two accounts
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Default app with extra/overridden env values (empty value = unset)
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let provider: Arc<dyn IdentityProvider> = Arc::new(
            ScriptedProvider::new()
                .with_profile("dana-code", "dana@gmail.com", "Dana Scully")
                .with_profile("alice-code", "a@x.com", "Alice (Google)"),
        );
        Self::build(overrides, Some(provider))
    }

    /// App without any identity provider
    pub fn without_provider() -> Self {
        Self::build(&[], None)
    }

    fn build(overrides: &[(&str, &str)], provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        let mut env: HashMap<String, String> = [
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", JWT_SECRET),
            ("ADMIN_SECRET_KEY", ADMIN_SECRET),
            ("POST_LOGIN_REDIRECT", POST_LOGIN_REDIRECT),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            env.insert(k.to_string(), v.to_string());
        }

        let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
        let tokens = TokenSigner::new(
            JWT_SECRET,
            Duration::seconds(config.jwt.access_ttl_secs),
            Duration::seconds(config.jwt.refresh_ttl_secs),
        );

        let memory = Arc::new(MemoryStore::new());
        let store: DynStore = memory.clone();
        let app = build_router(AppState::new(store.clone(), config, provider));

        Self {
            app,
            store,
            memory,
            tokens,
        }
    }

    pub async fn send(&self, request: TestRequest) -> TestResponse {
        let response = self.app.clone().oneshot(request.build()).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Signs up a regular user and returns the response body
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> Value {
        let response = self
            .send(TestRequest::post("/v1/auth").json(json!({
                "action": "signup",
                "email": email,
                "username": username,
                "password": password,
                "role": "user",
            })))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Signs up an admin with the configured secret and returns the response body
    pub async fn signup_admin(&self, email: &str, username: &str) -> Value {
        let response = self
            .send(TestRequest::post("/v1/auth").json(json!({
                "action": "signup",
                "email": email,
                "username": username,
                "password": "admin-pass",
                "role": "admin",
                "secretKey": ADMIN_SECRET,
            })))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Local access token of a freshly signed-up user
    pub async fn user_token(&self, email: &str, username: &str) -> String {
        let body = self.signup(email, username, "pw-123").await;
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Local access token of a freshly signed-up admin
    pub async fn admin_token(&self, email: &str, username: &str) -> String {
        let body = self.signup_admin(email, username).await;
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Stores a federated user with `role` and returns its session cookie value
    pub async fn federated_session(&self, email: &str, role: Role) -> String {
        let username = email.split('@').next().unwrap_or(email);
        let user = self
            .store
            .insert_user(CreateUser {
                email: email.to_string(),
                username: username.to_string(),
                name: format!("{} (federated)", email),
                password_hash: unusable_password(),
                role,
                phone: String::new(),
                address: String::new(),
            })
            .await
            .unwrap();

        let identity = AuthenticatedIdentity::from_user(&user, IdentitySource::Federated);
        self.tokens.issue(&identity, TokenType::Access).unwrap()
    }

    /// Access token for a crafted identity that need not exist in the store
    pub fn mint(&self, email: &str, role: Role, source: IdentitySource) -> String {
        let identity = AuthenticatedIdentity {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: format!("{} ({})", email, source),
            role,
            source,
        };
        self.tokens.issue(&identity, TokenType::Access).unwrap()
    }
}

/// Minimal valid booking body
pub fn booking_body(event_name: &str, date: &str, budget: i64) -> Value {
    json!({
        "eventType": "wedding",
        "eventName": event_name,
        "guestCount": 80,
        "date": date,
        "time": "18:00",
        "budget": budget,
        "notes": "Outdoor if possible",
        "organizerPreference": "any",
    })
}
