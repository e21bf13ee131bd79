//! Persistence layer
//!
//! Handlers never talk to a database directly. They go through three store
//! traits, each with a PostgreSQL implementation ([`postgres`]) and an
//! in-memory implementation ([`memory`]) used by tests and `memory://`
//! development mode:
//!
//! - [`UserStore`]: user accounts, unique by email
//! - [`SessionStore`]: login sessions keyed by token digest
//! - [`DocumentStore`]: JSON documents partitioned by [`Collection`]
//!
//! [`repository::Repository`] is the typed facade over [`DocumentStore`].
//!
//! No operation spans more than one store, so no operation is transactional
//! across collections.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resource::{Collection, Document, NewDocument};
use crate::models::session::Session;
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};

pub mod memory;
pub mod postgres;
pub mod repository;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with this email already exists
    #[error("Email already exists")]
    DuplicateEmail,

    /// The backend could not be reached or the pool is exhausted
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row or document does not match its model
    #[error("Stored data is malformed: {0}")]
    Corrupt(String),

    /// Any other backend failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Io(ref io) => StoreError::Unavailable(io.to_string()),
            sqlx::Error::Database(ref db_err) => {
                if db_err
                    .constraint()
                    .map(|c| c.contains("email"))
                    .unwrap_or(false)
                {
                    StoreError::DuplicateEmail
                } else {
                    StoreError::Database(db_err.to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user; the email is normalized before storage
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is taken
    async fn create(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Applies the non-None fields of `data`; returns None if the user doesn't exist
    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Users of a company, oldest first
    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, StoreError>;

    async fn count_by_company(&self, company_id: Uuid) -> Result<i64, StoreError>;

    /// Members of a company holding exactly `role`
    async fn count_by_role(&self, company_id: Uuid, role: UserRole) -> Result<i64, StoreError>;

    /// Removes every member from a company, resetting them to `employee`
    ///
    /// Returns how many users were detached.
    async fn detach_company(&self, company_id: Uuid) -> Result<u64, StoreError>;
}

/// Login sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> Result<(), StoreError>;

    /// Returns the session for `token_hash` only if it is still active at `now`
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError>;

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Deletes every session expired at `now`; returns how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Collection-partitioned JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: NewDocument) -> Result<Document, StoreError>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError>;

    /// Documents of one company, newest first
    async fn list(
        &self,
        collection: Collection,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: Collection, company_id: Uuid) -> Result<i64, StoreError>;

    /// Shallow-merges the keys of `patch` into the document body in one step
    ///
    /// Returns None if the document doesn't exist.
    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: JsonValue,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;

    /// Deletes every document owned by a company, in all collections
    async fn delete_by_company(&self, company_id: Uuid) -> Result<u64, StoreError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Which backend a [`Stores`] bundle talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Postgres => "postgres",
            BackendKind::Memory => "memory",
        }
    }
}

/// The three stores of one backend, cheap to clone
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub documents: Arc<dyn DocumentStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Stores backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            sessions: Arc::new(postgres::PgSessionStore::new(pool.clone())),
            documents: Arc::new(postgres::PgDocumentStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserStore::default()),
            sessions: Arc::new(memory::MemorySessionStore::default()),
            documents: Arc::new(memory::MemoryDocumentStore::default()),
            pool: None,
        }
    }

    pub fn kind(&self) -> BackendKind {
        if self.pool.is_some() {
            BackendKind::Postgres
        } else {
            BackendKind::Memory
        }
    }

    /// Underlying pool, for the Postgres backend
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Releases backend resources
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            crate::db::pool::close_pool(pool.clone()).await;
        }
    }
}
