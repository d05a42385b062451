//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON documents in insertion order, one
//! [`IndexMap`] per collection, behind an async-aware read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use indexmap::IndexMap;
use mea::rwlock::RwLock;
use bson::{Bson, Document, Uuid};

use docmodel_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query},
    update::UpdateResult,
};

use crate::evaluator::DocumentFilter;

type CollectionMap = IndexMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Ordering
///
/// Each collection iterates in insertion order. Queries, streams and
/// single-document updates rely on that order.
///
/// # Example
///
/// ```ignore
/// use docmodel_memory::InMemoryStore;
/// use docmodel::backend::StoreBackend;
/// use bson::{Uuid, doc};
///
/// let store = InMemoryStore::new();
///
/// let id = Uuid::new();
/// store.insert_documents(vec![(id, doc! { "_id": id, "name": "Vella" })], "restaurants").await?;
///
/// let docs = store.get_documents(vec![id], "restaurants").await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder that opens a fresh, empty store.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Creates a builder whose backends all share this store's data.
    ///
    /// Used where every operation opens its own "connection" but must see the
    /// same documents.
    pub fn connector(&self) -> InMemoryStoreBuilder {
        InMemoryStoreBuilder { store: Some(self.clone()) }
    }

    async fn select(&self, query: &Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let filter = DocumentFilter::compile(query.filter.as_ref())?;
        let store = self.store.read().await;

        Ok(match store.get(collection) {
            Some(collection_map) => filter.filter_documents(collection_map.values()),
            None => vec![],
        })
    }
}

/// Sets `value` at the dotted `path`, creating intermediate documents.
///
/// Returns whether the document changed.
fn set_path(document: &mut Document, path: &str, value: Bson) -> DocumentStoreResult<bool> {
    match path.split_once('.') {
        None => {
            let changed = document.get(path) != Some(&value);
            document.insert(path, value);
            Ok(changed)
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(child)) => set_path(child, rest, value),
                other => Err(DocumentStoreError::Backend(format!(
                    "Cannot create field '{rest}' in element {{{head}: {}}}",
                    other.map(|v| v.to_string()).unwrap_or_default()
                ))),
            }
        }
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    async fn insert_documents(&self, documents: Vec<(Uuid, Document)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        for (id, doc) in documents {
            let key = id.to_string();

            if collection_map.contains_key(&key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
            }

            collection_map.insert(key, doc);
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(
            ids
                .into_iter()
                .filter_map(|id| collection_map.get(&id.to_string()).cloned())
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.select(&query, collection).await
    }

    async fn stream_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<DocumentStream> {
        // The stream iterates a snapshot taken now; later writes are not observed.
        let documents = self.select(&query, collection).await?;

        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn update_documents(
        &self,
        filter: Option<Expr>,
        fields: Document,
        multi: bool,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        if fields.keys().any(|k| k == ID_FIELD || k.starts_with("_id.")) {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "`{ID_FIELD}` cannot be updated"
            )));
        }

        let filter = DocumentFilter::compile(filter.as_ref())?;
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(UpdateResult::default()),
        };

        let mut result = UpdateResult::default();

        for document in collection_map.values_mut() {
            if !filter.matches(document) {
                continue;
            }

            let mut updated = document.clone();
            let mut changed = false;

            for (path, value) in &fields {
                changed |= set_path(&mut updated, path, value.clone())?;
            }

            result.matched += 1;
            if changed {
                result.modified += 1;
                *document = updated;
            }

            if !multi {
                break;
            }
        }

        Ok(result)
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// A default builder opens a fresh store on every build; one obtained from
/// [`InMemoryStore::connector`] hands out clones of a shared store.
///
/// # Example
///
/// ```ignore
/// use docmodel_memory::InMemoryStore;
/// use docmodel::backend::StoreBackendBuilder;
///
/// let shared = InMemoryStore::new();
/// let backend = shared.connector().build().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreBuilder {
    store: Option<InMemoryStore>,
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// This always succeeds.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(self.store.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmodel_core::{document::with_id, query::Filter};

    async fn seeded(names: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        let documents = names
            .iter()
            .map(|name| {
                let id = Uuid::new();
                (id, with_id(id, doc! { "name": *name, "age": 3 }))
            })
            .collect();

        store.insert_documents(documents, "kittens").await.unwrap();
        store
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let store = InMemoryStore::new();
        let id = Uuid::new();

        store.insert_documents(vec![(id, with_id(id, doc! {}))], "puppies").await.unwrap();
        let result = store.insert_documents(vec![(id, with_id(id, doc! {}))], "puppies").await;

        assert!(matches!(result, Err(DocumentStoreError::DocumentAlreadyExists(..))));
    }

    #[tokio::test]
    async fn single_update_touches_only_the_first_match() {
        let store = seeded(&["fluffy", "Yoda", "Fluffball"]).await;

        let result = store
            .update_documents(None, doc! { "name": "Yodsie" }, false, "kittens")
            .await
            .unwrap();
        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

        let names = store
            .query_documents(Query::all(), "kittens")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.get_str("name").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Yodsie", "Yoda", "Fluffball"]);
    }

    #[tokio::test]
    async fn multi_update_touches_every_match() {
        let store = seeded(&["fluffy", "Yoda", "Fluffball"]).await;

        let result = store
            .update_documents(Some(Filter::matches("name", "^Fluff")), doc! { "age": 4 }, true, "kittens")
            .await
            .unwrap();

        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

        let result = store
            .update_documents(None, doc! { "color": "white" }, true, "kittens")
            .await
            .unwrap();

        assert_eq!(result, UpdateResult { matched: 3, modified: 3 });
    }

    #[tokio::test]
    async fn update_sets_dotted_paths_and_counts_noops() {
        let store = seeded(&["Keith"]).await;

        store
            .update_documents(None, doc! { "owner.name.first": "Keith" }, false, "kittens")
            .await
            .unwrap();
        let result = store
            .update_documents(None, doc! { "age": 3 }, false, "kittens")
            .await
            .unwrap();
        assert_eq!(result, UpdateResult { matched: 1, modified: 0 });

        let found = store
            .query_documents(Query::filtered(Filter::eq("owner.name.first", "Keith")), "kittens")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn update_cannot_change_identity() {
        let store = seeded(&["fluffy"]).await;
        let result = store
            .update_documents(None, doc! { "_id": Uuid::new() }, false, "kittens")
            .await;

        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn update_on_missing_collection_matches_nothing() {
        let store = InMemoryStore::new();
        let result = store
            .update_documents(None, doc! { "name": "Yodsie" }, false, "kittens")
            .await
            .unwrap();

        assert_eq!(result, UpdateResult::default());
    }

    #[tokio::test]
    async fn invalid_pattern_fails_before_any_update() {
        let store = seeded(&["fluffy"]).await;
        let result = store
            .update_documents(Some(Filter::matches("name", "[")), doc! { "age": 4 }, true, "kittens")
            .await;

        assert!(matches!(result, Err(DocumentStoreError::InvalidQuery(_))));

        let found = store
            .query_documents(Query::filtered(Filter::eq("age", 3)), "kittens")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn streams_in_insertion_order() {
        let store = seeded(&["fluffy", "Yoda"]).await;

        let names = store
            .stream_documents(Query::all(), "kittens")
            .await
            .unwrap()
            .map(|d| d.unwrap().get_str("name").unwrap().to_string())
            .collect::<Vec<_>>()
            .await;

        assert_eq!(names, ["fluffy", "Yoda"]);
    }

    #[tokio::test]
    async fn connector_shares_data() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store.insert_documents(vec![(id, with_id(id, doc! {}))], "people").await.unwrap();

        let opened = store.connector().build().await.unwrap();
        let fresh = InMemoryStore::builder().build().await.unwrap();

        assert_eq!(opened.get_documents(vec![id], "people").await.unwrap().len(), 1);
        assert!(fresh.get_documents(vec![id], "people").await.unwrap().is_empty());
    }
}
