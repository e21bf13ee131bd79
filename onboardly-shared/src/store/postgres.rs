//! PostgreSQL store backend
//!
//! Runtime-checked queries (`query_as::<_, T>`) against the schema in
//! `migrations/`. Enums are bound through their `as_str()` form and decoded
//! with `#[sqlx(try_from = "String")]`. Timestamps are generated in Rust so
//! both backends stamp records the same way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentStore, SessionStore, StoreError, UserStore};
use crate::models::resource::{Collection, Document, NewDocument};
use crate::models::session::Session;
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User, UserRole};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, company_id, created_at, updated_at, last_login_at";

const DOCUMENT_COLUMNS: &str = "id, collection, company_id, body, created_at, updated_at";

/// PostgreSQL [`UserStore`]
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO users (id, email, password_hash, name, role, company_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.name)
            .bind(data.role.as_str())
            .bind(data.company_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut query = String::from("UPDATE users SET updated_at = $2");
        let mut bind_count = 2;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.company_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", company_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id).bind(Utc::now());

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(role) = data.role {
            q = q.bind(role.as_str());
        }
        if let Some(company_id) = data.company_id {
            q = q.bind(company_id);
        }

        let user = q.fetch_optional(&self.pool).await?;

        Ok(user)
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users
             WHERE company_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3",
            USER_COLUMNS
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count_by_company(&self, company_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_by_role(&self, company_id: Uuid, role: UserRole) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE company_id = $1 AND role = $2")
                .bind(company_id)
                .bind(role.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn detach_company(&self, company_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET company_id = NULL, role = $2, updated_at = $3
             WHERE company_id = $1",
        )
        .bind(company_id)
        .bind(UserRole::Employee.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL [`SessionStore`]
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions
             WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL [`DocumentStore`]
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, doc: NewDocument) -> Result<Document, StoreError> {
        let query = format!(
            "INSERT INTO documents (id, collection, company_id, body, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {}",
            DOCUMENT_COLUMNS
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(doc.id)
            .bind(doc.collection.as_str())
            .bind(doc.company_id)
            .bind(doc.body)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(document)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = $2",
            DOCUMENT_COLUMNS
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(document)
    }

    async fn list(
        &self,
        collection: Collection,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents
             WHERE collection = $1 AND company_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4",
            DOCUMENT_COLUMNS
        );

        let documents = sqlx::query_as::<_, Document>(&query)
            .bind(collection.as_str())
            .bind(company_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    async fn count(&self, collection: Collection, company_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND company_id = $2",
        )
        .bind(collection.as_str())
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: JsonValue,
    ) -> Result<Option<Document>, StoreError> {
        // jsonb || is a shallow, top-level key merge evaluated in one statement
        let query = format!(
            "UPDATE documents SET body = body || $3, updated_at = $4
             WHERE collection = $1 AND id = $2
             RETURNING {}",
            DOCUMENT_COLUMNS
        );

        let document = sqlx::query_as::<_, Document>(&query)
            .bind(collection.as_str())
            .bind(id)
            .bind(patch)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(document)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_company(&self, company_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
