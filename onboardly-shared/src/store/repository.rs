use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use super::{DocumentStore, StoreError};
use crate::models::resource::{NewDocument, Record, Resource};

/// Typed access to one document collection
///
/// Converts between `T` and stored JSON bodies. Tenant and role checks are
/// the caller's job; the repository only knows ids.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<T: Resource> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Stores a new document owned by `company_id`
    pub async fn create(&self, company_id: Uuid, fields: T) -> Result<Record<T>, StoreError> {
        self.insert(Uuid::new_v4(), company_id, fields).await
    }

    /// Stores a new document that owns itself (`company_id == id`)
    pub async fn create_owned(&self, fields: T) -> Result<Record<T>, StoreError> {
        let id = Uuid::new_v4();
        self.insert(id, id, fields).await
    }

    async fn insert(&self, id: Uuid, company_id: Uuid, fields: T) -> Result<Record<T>, StoreError> {
        let doc = self
            .store
            .insert(NewDocument {
                id,
                collection: T::COLLECTION,
                company_id,
                body: serde_json::to_value(&fields)?,
            })
            .await?;

        Ok(Record::try_from(doc)?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Record<T>>, StoreError> {
        match self.store.find_by_id(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(Record::try_from(doc)?)),
            None => Ok(None),
        }
    }

    /// One page of a company's documents, newest first
    pub async fn list(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Record<T>>, StoreError> {
        self.store
            .list(T::COLLECTION, company_id, limit, offset)
            .await?
            .into_iter()
            .map(|doc| Record::try_from(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn count(&self, company_id: Uuid) -> Result<i64, StoreError> {
        self.store.count(T::COLLECTION, company_id).await
    }

    /// Applies the fields present in `patch`
    ///
    /// An empty patch leaves the document untouched and returns it as stored.
    pub async fn update(&self, id: Uuid, patch: &T::Patch) -> Result<Option<Record<T>>, StoreError> {
        let value = serde_json::to_value(patch)?;
        if value.as_object().map(|o| o.is_empty()).unwrap_or(false) {
            return self.get(id).await;
        }

        match self.store.merge(T::COLLECTION, id, value).await? {
            Some(doc) => Ok(Some(Record::try_from(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }
}
