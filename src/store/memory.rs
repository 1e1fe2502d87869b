use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    apply_set, with_id, Collection, DeleteResult, Document, DocumentStore, Filter,
    InsertOneResult, UpdateResult,
};

/// In-process store for tests. Counts every call so tests can assert that a
/// rejected request never reached persistence.
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<(Uuid, Document)>>,
    recommendations: RwLock<Vec<(Uuid, Document)>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn coll(&self, coll: Collection) -> &RwLock<Vec<(Uuid, Document)>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match coll {
            Collection::Products => &self.products,
            Collection::Recommendations => &self.recommendations,
        }
    }
}

fn matches(filter: &Filter, doc: &Document) -> bool {
    match filter {
        Filter::All => true,
        Filter::OwnerEmail(email) => {
            doc.get("owner")
                .and_then(|o| o.get("email"))
                .and_then(Value::as_str)
                == Some(email.as_str())
        }
        Filter::Email(email) => doc.get("email").and_then(Value::as_str) == Some(email.as_str()),
        Filter::Featured => doc.get("featured") == Some(&Value::Bool(true)),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, coll: Collection, doc: Document) -> anyhow::Result<InsertOneResult> {
        let id = Uuid::new_v4();
        self.coll(coll).write().await.push((id, doc));
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Value>> {
        let docs = self.coll(coll).read().await;
        Ok(docs
            .iter()
            .filter(|(_, d)| matches(&filter, d))
            .map(|(id, d)| with_id(*id, d.clone()))
            .collect())
    }

    async fn find_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<Option<Value>> {
        let docs = self.coll(coll).read().await;
        Ok(docs
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(i, d)| with_id(*i, d.clone())))
    }

    async fn update_one_upsert(
        &self,
        coll: Collection,
        id: Uuid,
        fields: Document,
    ) -> anyhow::Result<UpdateResult> {
        let mut docs = self.coll(coll).write().await;
        if let Some((_, doc)) = docs.iter_mut().find(|(i, _)| *i == id) {
            let changed = apply_set(doc, &fields);
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(changed),
                upserted_count: 0,
                upserted_id: None,
            });
        }
        docs.push((id, fields));
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        })
    }

    async fn delete_one(&self, coll: Collection, id: Uuid) -> anyhow::Result<DeleteResult> {
        let mut docs = self.coll(coll).write().await;
        let before = docs.len();
        if let Some(pos) = docs.iter().position(|(i, _)| *i == id) {
            docs.remove(pos);
        }
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: (before - docs.len()) as u64,
        })
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn owner_filter_reads_nested_email() {
        let d = doc(json!({ "owner": { "email": "a@x.com" } }));
        assert!(matches(&Filter::OwnerEmail("a@x.com".into()), &d));
        assert!(!matches(&Filter::OwnerEmail("b@x.com".into()), &d));
        assert!(!matches(&Filter::Email("a@x.com".into()), &d));
    }

    #[test]
    fn featured_requires_literal_true() {
        assert!(matches(&Filter::Featured, &doc(json!({ "featured": true }))));
        assert!(!matches(&Filter::Featured, &doc(json!({ "featured": "true" }))));
        assert!(!matches(&Filter::Featured, &doc(json!({}))));
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let created = store
            .update_one_upsert(Collection::Products, id, doc(json!({ "productName": "Tea" })))
            .await
            .expect("upsert");
        assert_eq!(created.upserted_count, 1);
        assert_eq!(created.upserted_id, Some(id));

        let same = store
            .update_one_upsert(Collection::Products, id, doc(json!({ "productName": "Tea" })))
            .await
            .expect("update");
        assert_eq!((same.matched_count, same.modified_count), (1, 0));

        let found = store.find_one(Collection::Products, id).await.expect("find");
        assert_eq!(found.expect("present")["productName"], "Tea");
    }

    #[tokio::test]
    async fn delete_twice_reports_zero_second_time() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_one(Collection::Recommendations, doc(json!({ "email": "a@x.com" })))
            .await
            .expect("insert");
        let first = store
            .delete_one(Collection::Recommendations, inserted.inserted_id)
            .await
            .expect("delete");
        let second = store
            .delete_one(Collection::Recommendations, inserted.inserted_id)
            .await
            .expect("delete");
        assert_eq!(first.deleted_count, 1);
        assert_eq!(second.deleted_count, 0);
        assert_eq!(store.calls(), 3);
    }
}
