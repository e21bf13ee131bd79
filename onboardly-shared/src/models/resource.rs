//! Document-backed resources
//!
//! Companies and everything a company owns (jobs, projects, tasks,
//! responsibilities, onboardings, FAQs) are stored as JSON documents in a
//! single collection-partitioned store. Each model implements [`Resource`]
//! to declare its collection and its partial-update shape.
//!
//! Every document carries the id of the company that owns it. A company
//! document owns itself (`company_id == id`), which lets tenant checks treat
//! all collections the same way.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     id UUID PRIMARY KEY,
//!     collection VARCHAR(64) NOT NULL,
//!     company_id UUID NOT NULL,
//!     body JSONB NOT NULL DEFAULT '{}',
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Companies,
    Faqs,
    Jobs,
    Onboardings,
    Projects,
    Responsibilities,
    Tasks,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Companies,
        Collection::Faqs,
        Collection::Jobs,
        Collection::Onboardings,
        Collection::Projects,
        Collection::Responsibilities,
        Collection::Tasks,
    ];

    /// Converts collection to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Companies => "companies",
            Collection::Faqs => "faqs",
            Collection::Jobs => "jobs",
            Collection::Onboardings => "onboardings",
            Collection::Projects => "projects",
            Collection::Responsibilities => "responsibilities",
            Collection::Tasks => "tasks",
        }
    }

    /// Singular, human-readable name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Companies => "Company",
            Collection::Faqs => "FAQ",
            Collection::Jobs => "Job",
            Collection::Onboardings => "Onboarding",
            Collection::Projects => "Project",
            Collection::Responsibilities => "Responsibility",
            Collection::Tasks => "Task",
        }
    }
}

/// Raised when a stored collection name is unknown
#[derive(Debug, thiserror::Error)]
#[error("Unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl std::str::FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

impl TryFrom<String> for Collection {
    type Error = UnknownCollection;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A model persisted as a document
///
/// The implementing type is the full, validated body used on create. `Patch`
/// is the partial-update body: every field optional, `None` fields skipped
/// when serialized so a patch only touches what the client sent.
pub trait Resource:
    Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static
{
    /// Collection the documents live in
    const COLLECTION: Collection;

    /// Whether any member of the owning company may apply a patch, rather
    /// than managers and admins only
    const MEMBER_UPDATABLE: bool = false;

    /// Partial-update body
    type Patch: Serialize + DeserializeOwned + Validate + Send + Sync + 'static;
}

/// Raw stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,

    #[sqlx(try_from = "String")]
    pub collection: Collection,

    /// Owning company (a company's own id for company documents)
    pub company_id: Uuid,

    pub body: JsonValue,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a document
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub collection: Collection,
    pub company_id: Uuid,
    pub body: JsonValue,
}

/// Typed view of a document, as sent to clients
///
/// Body fields are flattened next to the document metadata:
///
/// ```json
/// { "id": "...", "company_id": "...", "title": "Backend Engineer", "created_at": "...", "updated_at": "..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: Uuid,

    pub company_id: Uuid,

    #[serde(flatten)]
    pub fields: T,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl<T: DeserializeOwned> TryFrom<Document> for Record<T> {
    type Error = serde_json::Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(Self {
            id: doc.id,
            company_id: doc.company_id,
            fields: serde_json::from_value(doc.body)?,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
