/// Configuration management for the API server
///
/// Sources, lowest priority first:
///
/// 1. built-in defaults
/// 2. `config/default.toml`
/// 3. `config/{APP_ENV}.toml`
/// 4. `config/local.toml`
/// 5. `ONBOARDLY__*` environment variables (`ONBOARDLY__SESSION__SECRET`, ...)
/// 6. legacy variables: `SESSION_CONF`, `PROD_DB` (or `DATABASE_URL`),
///    `NODE_ENV`, `PORT`
///
/// Every file is optional. A `.env` file is loaded first when present.
///
/// # Example
///
/// ```no_run
/// use onboardly_api::config::Config;
///
/// # fn example() -> Result<(), onboardly_api::config::ConfigError> {
/// let config = Config::load()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use onboardly_shared::auth::middleware::SessionSettings;
use onboardly_shared::auth::token::{SessionKey, MIN_SECRET_LENGTH};
use onboardly_shared::db::pool::DatabaseConfig;
use serde::{Deserialize, Serialize};

/// Database URL that selects the in-memory stores
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Run mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,

    pub api: ApiConfig,

    pub database: DatabaseSettings,

    pub session: SessionConfig,

    pub log: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` allows any origin without credentials
    pub cors_origins: Vec<String>,

    /// Built front-end served in production
    pub static_dir: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec!["*".to_string()],
            static_dir: "client/build".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL URL, or `memory://` for the in-memory stores
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,

    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let pool = DatabaseConfig::default();
        Self {
            url: String::new(),
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_seconds: pool.connect_timeout_seconds,
        }
    }
}

impl DatabaseSettings {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }

    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// Longest accepted session lifetime (30 days)
pub const MAX_SESSION_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Session configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC key for session token digests; at least 32 bytes
    pub secret: String,

    pub cookie_name: String,

    /// Fixed session lifetime
    pub ttl_seconds: u64,

    pub http_only: bool,

    /// How often expired sessions are purged
    pub reap_interval_seconds: u64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("http_only", &self.http_only)
            .field("reap_interval_seconds", &self.reap_interval_seconds)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: "onboardly.sid".to_string(),
            ttl_seconds: 3600,
            http_only: true,
            reap_interval_seconds: 600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Config {
    /// Loads configuration from files and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a file is malformed, a value has the wrong type,
    /// or the result fails [`Config::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("APP_ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("ONBOARDLY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .try_parsing(true),
            );

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_legacy_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Applies the legacy environment variables on top of the loaded values
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("SESSION_CONF") {
            self.session.secret = secret;
        }

        if let Some(url) = lookup("PROD_DB").or_else(|| lookup("DATABASE_URL")) {
            self.database.url = url;
        }

        if let Some(node_env) = lookup("NODE_ENV") {
            if let Some(environment) = Environment::parse(&node_env) {
                self.environment = environment;
            }
        }

        if let Some(port) = lookup("PORT") {
            self.api.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {}", port)))?;
        }

        Ok(())
    }

    /// Checks the values the server can't start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "session.secret must be at least {} bytes (set SESSION_CONF or ONBOARDLY__SESSION__SECRET)",
                MIN_SECRET_LENGTH
            )));
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.url is required (set PROD_DB, DATABASE_URL, or use memory://)".to_string(),
            ));
        }

        if self.session.ttl_seconds == 0 {
            return Err(ConfigError::Invalid("session.ttl_seconds must be > 0".to_string()));
        }

        if self.session.ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "session.ttl_seconds must be at most {}",
                MAX_SESSION_TTL_SECONDS
            )));
        }

        if self.session.reap_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "session.reap_interval_seconds must be > 0".to_string(),
            ));
        }

        let name = &self.session.cookie_name;
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b"._-".contains(&b)) {
            return Err(ConfigError::Invalid(format!(
                "session.cookie_name is not a valid cookie name: {:?}",
                name
            )));
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Cookie settings derived from the session section and run mode
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cookie_name: self.session.cookie_name.clone(),
            ttl: Duration::seconds(self.session.ttl_seconds.min(MAX_SESSION_TTL_SECONDS) as i64),
            secure: self.environment.is_production(),
            http_only: self.session.http_only,
        }
    }

    pub fn session_key(&self) -> Result<SessionKey, ConfigError> {
        SessionKey::new(self.session.secret.as_bytes())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
