//! Common test utilities for integration tests
//!
//! Every test gets its own in-memory stores and router:
//! - a seeded user `a@b.com` / `secret1` without a company
//! - helpers to seed companies and members directly in the stores
//! - request helpers that return the status, headers, and JSON body

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use onboardly_api::app::{build_router, AppState};
use onboardly_api::config::{Config, MEMORY_DATABASE_URL};
use onboardly_shared::auth::password::hash_password;
use onboardly_shared::models::company::Company;
use onboardly_shared::models::user::{CreateUser, User, UserRole};
use onboardly_shared::store::repository::Repository;
use onboardly_shared::store::Stores;
use serde_json::Value;
use tower::Service as _;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret-integration-secret";
pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.secret = SECRET.to_string();
    config.database.url = MEMORY_DATABASE_URL.to_string();
    config
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub stores: Stores,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
}

/// A finished request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` of the first `Set-Cookie` header
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|pair| pair.trim().to_string())
    }

    pub fn set_cookie_header(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::with_stores(config, Stores::in_memory()).await
    }

    pub async fn with_stores(config: Config, stores: Stores) -> Self {
        let state = AppState::new(config.clone(), stores.clone()).unwrap();
        let app = build_router(state);

        let user = seed_user(&stores, EMAIL, PASSWORD, UserRole::Employee, None).await;

        TestContext {
            stores,
            app,
            config,
            user,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Logs in and returns the session cookie pair
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/users/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        response.cookie().expect("login sets a cookie")
    }

    /// Seeds a company with an admin, a manager, and an employee; returns
    /// their session cookies
    pub async fn seed_company(&self, name: &str) -> SeededCompany {
        let company = Repository::<Company>::new(self.stores.documents.clone())
            .create_owned(Company::named(name))
            .await
            .unwrap();

        let slug = name.to_lowercase().replace(' ', "-");
        let mut cookies = Vec::new();
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Employee] {
            let email = format!("{}@{}.test", role.as_str(), slug);
            seed_user(&self.stores, &email, PASSWORD, role, Some(company.id)).await;
            cookies.push(self.login(&email, PASSWORD).await);
        }

        let employee = cookies.pop().unwrap_or_default();
        let manager = cookies.pop().unwrap_or_default();
        let admin = cookies.pop().unwrap_or_default();

        SeededCompany {
            id: company.id,
            admin,
            manager,
            employee,
        }
    }
}

/// A company and the cookies of its members
pub struct SeededCompany {
    pub id: Uuid,
    pub admin: String,
    pub manager: String,
    pub employee: String,
}

pub async fn seed_user(
    stores: &Stores,
    email: &str,
    password: &str,
    role: UserRole,
    company_id: Option<Uuid>,
) -> User {
    stores
        .users
        .create(CreateUser {
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            name: Some("Test User".to_string()),
            role,
            company_id,
        })
        .await
        .unwrap()
}
