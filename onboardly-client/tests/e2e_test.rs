/// End-to-end tests: the client forms against a real server on a loopback port

use std::net::SocketAddr;

use onboardly_api::app::{build_router, AppState};
use onboardly_api::config::{Config, MEMORY_DATABASE_URL};
use onboardly_client::api::{ApiClient, AuthApi, LoginOutcome};
use onboardly_client::auth::AuthContext;
use onboardly_client::form::SubmitState;
use onboardly_client::login::{self, LoginForm, PROFILE_ROUTE};
use onboardly_client::register::{self, RegisterForm};
use onboardly_shared::auth::password::hash_password;
use onboardly_shared::models::user::{CreateUser, UserRole};
use onboardly_shared::store::Stores;
use tokio::net::TcpListener;

/// Starts a server with a seeded `a@b.com` / `secret1` user
async fn spawn_server() -> SocketAddr {
    let mut config = Config::default();
    config.session.secret = "e2e-secret-e2e-secret-e2e-secret-e2e".to_string();
    config.database.url = MEMORY_DATABASE_URL.to_string();

    let stores = Stores::in_memory();
    stores
        .users
        .create(CreateUser {
            email: "a@b.com".to_string(),
            password_hash: hash_password("secret1").unwrap(),
            name: None,
            role: UserRole::Employee,
            company_id: None,
        })
        .await
        .unwrap();

    let app = build_router(AppState::new(config, stores).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(format!("http://{}", addr)).unwrap()
}

#[tokio::test]
async fn test_login_form_against_server() {
    let addr = spawn_server().await;
    let api = client(addr);
    let mut auth = AuthContext::restore(&api).await.unwrap();
    assert!(!auth.is_logged_in());

    let mut form = LoginForm::new();
    form.on_mount(&auth);
    assert_eq!(form.redirect(), None);

    form.input(login::EMAIL_FIELD, "a@b.com");
    form.input(login::PASSWORD_FIELD, "secret1");
    assert!(form.submit(&api, &mut auth).await);

    assert_eq!(form.state(), &SubmitState::Succeeded);
    assert_eq!(form.redirect(), Some(PROFILE_ROUTE));
    assert_eq!(auth.user().unwrap().email, "a@b.com");

    // The cookie store carries the session
    let current = api.current_user().await.unwrap();
    assert_eq!(current.unwrap().email, "a@b.com");

    let restored = AuthContext::restore(&api).await.unwrap();
    let mut again = LoginForm::new();
    again.on_mount(&restored);
    assert_eq!(again.redirect(), Some(PROFILE_ROUTE));

    auth.sign_out(&api).await.unwrap();
    assert!(!auth.is_logged_in());
    assert!(api.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn test_wrong_password_shows_popup() {
    let addr = spawn_server().await;
    let api = client(addr);
    let mut auth = AuthContext::new();

    let mut form = LoginForm::new();
    form.input(login::EMAIL_FIELD, "a@b.com");
    form.input(login::PASSWORD_FIELD, "not-the-password");
    form.submit(&api, &mut auth).await;

    let popup = form.state().popup().unwrap();
    assert_eq!(popup.title, "Login failed");
    assert_eq!(popup.message, "Incorrect email or password.");
    assert!(!auth.is_logged_in());

    assert_eq!(
        api.login("nobody@b.com", "secret1").await.unwrap(),
        LoginOutcome::Rejected("Incorrect email or password.".to_string())
    );
}

#[tokio::test]
async fn test_register_form_against_server() {
    let addr = spawn_server().await;
    let api = client(addr);
    let mut auth = AuthContext::new();

    let mut form = RegisterForm::new();
    form.input(register::EMAIL_FIELD, "founder@acme.test");
    form.input(register::PASSWORD_FIELD, "secret1");
    form.input(register::NAME_FIELD, "Founder");
    form.input(register::COMPANY_NAME_FIELD, "Acme");
    assert!(form.submit(&api, &mut auth).await);

    assert_eq!(form.state(), &SubmitState::Succeeded);
    let user = auth.user().unwrap();
    assert_eq!(user.role, UserRole::Admin);
    assert!(user.company_id.is_some());

    let current = api.current_user().await.unwrap().unwrap();
    assert_eq!(current.email, "founder@acme.test");

    let mut duplicate = RegisterForm::new();
    duplicate.input(register::EMAIL_FIELD, "a@b.com");
    duplicate.input(register::PASSWORD_FIELD, "secret1");
    duplicate.input(register::COMPANY_NAME_FIELD, "Other");
    duplicate.submit(&client(addr), &mut AuthContext::new()).await;

    assert_eq!(
        duplicate.state().popup().map(|p| p.message.as_str()),
        Some("Email already exists")
    );
}
