use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgDocumentStore;

/// A JSON object document as stored, without its `_id`.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Recommendations,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Recommendations => "recommendations",
        }
    }
}

/// Query filters supported by `find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// `owner.email == value`
    OwnerEmail(String),
    /// top-level `email == value`
    Email(String),
    /// `featured == true`
    Featured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Document persistence used by the HTTP handlers.
///
/// Every handler performs at most one call on this trait. Returned documents
/// carry their identifier as `_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, coll: Collection, doc: Document) -> anyhow::Result<InsertOneResult>;
    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Value>>;
    async fn find_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<Option<Value>>;
    /// Sets `fields` on the document with `id`, creating it when absent.
    async fn update_one_upsert(
        &self,
        coll: Collection,
        id: Uuid,
        fields: Document,
    ) -> anyhow::Result<UpdateResult>;
    async fn delete_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<DeleteResult>;
    /// Releases the underlying connections. Called once at shutdown.
    async fn close(&self);
}

/// Validates a client-supplied identifier before it becomes a lookup key.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId(raw.to_string()))
}

/// Turns an incoming JSON body into a storable document.
///
/// Any `_id` supplied by the client is dropped; the store assigns identifiers.
pub fn into_document(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(mut map) => {
            map.remove("_id");
            Ok(map)
        }
        _ => Err(ApiError::BadRequest("document must be a JSON object".into())),
    }
}

/// Renders a stored document with its identifier as `_id`.
pub fn with_id(id: Uuid, doc: Document) -> Value {
    let mut out = Map::with_capacity(doc.len() + 1);
    out.insert("_id".into(), Value::String(id.to_string()));
    out.extend(doc.into_iter().filter(|(k, _)| k != "_id"));
    Value::Object(out)
}

/// `$set` semantics: overwrite top-level keys, keep the rest.
pub(crate) fn apply_set(target: &mut Document, fields: &Document) -> bool {
    let mut changed = false;
    for (k, v) in fields {
        if target.get(k) != Some(v) {
            target.insert(k.clone(), v.clone());
            changed = true;
        }
    }
    changed
}
