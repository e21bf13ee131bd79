//! In-memory store backend
//!
//! Process-local maps behind `tokio::sync::RwLock`. Used by the test suites
//! and when the server runs with `database.url = "memory://"`. Semantics
//! match the PostgreSQL backend: emails are unique case-insensitively,
//! merges are atomic per document, listings are newest first.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, SessionStore, StoreError, UserStore};
use crate::models::resource::{Collection, Document, NewDocument};
use crate::models::session::Session;
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User, UserRole};

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// In-memory [`UserStore`]
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, data: CreateUser) -> Result<User, StoreError> {
        let email = normalize_email(&data.email);
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: data.password_hash,
            name: data.name,
            role: data.role,
            company_id: data.company_id,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(email) = &data.email {
            let email = normalize_email(email);
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = data.email {
            user.email = normalize_email(&email);
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        if let Some(company_id) = data.company_id {
            user.company_id = company_id;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.last_login_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.company_id == Some(company_id))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        Ok(page(users, limit, offset))
    }

    async fn count_by_company(&self, company_id: Uuid) -> Result<i64, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.company_id == Some(company_id)).count() as i64)
    }

    async fn count_by_role(&self, company_id: Uuid, role: UserRole) -> Result<i64, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.company_id == Some(company_id) && u.role == role)
            .count() as i64)
    }

    async fn detach_company(&self, company_id: Uuid) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let now = Utc::now();
        let mut detached = 0;

        for user in users.values_mut().filter(|u| u.company_id == Some(company_id)) {
            user.company_id = None;
            user.role = UserRole::Employee;
            user.updated_at = now;
            detached += 1;
        }

        Ok(detached)
    }
}

/// In-memory [`SessionStore`]
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(token_hash)
            .filter(|s| s.is_active_at(now))
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_active_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory [`DocumentStore`]
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(Collection, Uuid), Document>>,
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, doc: NewDocument) -> Result<Document, StoreError> {
        let now = Utc::now();
        let document = Document {
            id: doc.id,
            collection: doc.collection,
            company_id: doc.company_id,
            body: doc.body,
            created_at: now,
            updated_at: now,
        };

        let mut documents = self.documents.write().await;
        if documents.contains_key(&(doc.collection, doc.id)) {
            return Err(StoreError::Database(format!(
                "Duplicate document id {} in {}",
                doc.id,
                doc.collection.as_str()
            )));
        }
        documents.insert((doc.collection, doc.id), document.clone());

        Ok(document)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(&(collection, id)).cloned())
    }

    async fn list(
        &self,
        collection: Collection,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.collection == collection && d.company_id == company_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(page(docs, limit, offset))
    }

    async fn count(&self, collection: Collection, company_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.collection == collection && d.company_id == company_id)
            .count() as i64)
    }

    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: JsonValue,
    ) -> Result<Option<Document>, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(&(collection, id)) else {
            return Ok(None);
        };

        match (&mut document.body, patch) {
            (JsonValue::Object(body), JsonValue::Object(patch)) => {
                for (key, value) in patch {
                    body.insert(key, value);
                }
            }
            (_, patch) => {
                return Err(StoreError::Corrupt(format!(
                    "Cannot merge {} into a non-object document",
                    patch
                )));
            }
        }
        document.updated_at = Utc::now();

        Ok(Some(document.clone()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .documents
            .write()
            .await
            .remove(&(collection, id))
            .is_some())
    }

    async fn delete_by_company(&self, company_id: Uuid) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, d| d.company_id != company_id);
        Ok((before - documents.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
