/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use onboardly_api::{app::{build_router, AppState}, config::Config};
/// use onboardly_shared::store::Stores;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let state = AppState::new(config, Stores::in_memory())?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, ConfigError},
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
    routes,
};
use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use onboardly_shared::auth::middleware::{session_middleware, SessionManager};
use onboardly_shared::auth::strategy::{AuthStrategy, LocalStrategy};
use onboardly_shared::models::{
    faq::Faq, job::Job, onboarding::Onboarding, project::Project,
    responsibility::Responsibility, task::Task,
};
use onboardly_shared::store::Stores;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; every field is
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub stores: Stores,

    pub sessions: SessionManager,

    /// Credential check used by the login handler
    pub strategy: Arc<dyn AuthStrategy>,
}

impl AppState {
    /// Creates state with the default [`LocalStrategy`]
    ///
    /// # Errors
    ///
    /// Returns an error if the session secret is unusable.
    pub fn new(config: Config, stores: Stores) -> Result<Self, ConfigError> {
        let sessions = SessionManager::new(
            stores.sessions.clone(),
            stores.users.clone(),
            config.session_key()?,
            config.session_settings(),
        );
        let strategy = Arc::new(LocalStrategy::new(stores.users.clone()));

        Ok(Self {
            config: Arc::new(config),
            stores,
            sessions,
            strategy,
        })
    }

    /// Replaces the authentication strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.strategy = strategy;
        self
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// ├── /api/
/// │   ├── /users             register, login, logout, current, list, read, update
/// │   ├── /companies         create, list, read, update, delete
/// │   ├── /faqs              ┐
/// │   ├── /jobs              │
/// │   ├── /onboarding        │ create, list, read, update, delete
/// │   ├── /projects          │ (company-scoped)
/// │   ├── /responsibilities  │
/// │   ├── /tasks             ┘
/// │   └── *                  404 envelope
/// └── *                      static files + index.html (production only)
/// ```
///
/// Middleware, outermost first: security headers, CORS, compression,
/// tracing, session resolution.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/users", routes::users::router())
        .nest("/companies", routes::companies::router())
        .nest("/faqs", routes::resources::router::<Faq>())
        .nest("/jobs", routes::resources::router::<Job>())
        .nest("/onboarding", routes::resources::router::<Onboarding>())
        .nest("/projects", routes::resources::router::<Project>())
        .nest("/responsibilities", routes::resources::router::<Responsibility>())
        .nest("/tasks", routes::resources::router::<Task>())
        .fallback(api_not_found);

    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes);

    if state.config.environment.is_production() {
        let static_dir = PathBuf::from(&state.config.api.static_dir);
        let index = static_dir.join("index.html");
        tracing::info!(static_dir = %static_dir.display(), "Serving front-end build");

        router = router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)));
    }

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.environment.is_production();

    router
        .layer(from_fn_with_state(state.sessions.clone(), session_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
