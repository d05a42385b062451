//! Unchecked access to a named collection.
//!
//! [`Collection`] passes documents straight to the backend: no schema, no
//! coercion, no field filtering. It is the storage side of the raw access
//! layer and the base the schema-checked
//! [`ModelCollection`](crate::model::ModelCollection) builds on.
//!
//! ```ignore
//! let restaurants = store.collection("restaurants");
//! let id = restaurants.insert_one(doc! { "name": "Vella", "borough": "Manhattan" }).await?;
//! let found = restaurants.find(Query::filtered(Filter::eq("borough", "Manhattan"))).await?;
//! ```

use bson::{Document, Uuid};

use crate::{
    backend::{DocumentStream, StoreBackend},
    document::ensure_id,
    error::DocumentStoreResult,
    query::{Expr, Query},
    update::UpdateResult,
};

/// An untyped collection with a reference to a storage backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts one document, generating its `_id` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if `_id` is present but not a UUID, or if the backend
    /// rejects the insert.
    pub async fn insert_one(&self, document: Document) -> DocumentStoreResult<Uuid> {
        let (id, document) = ensure_id(document)?;

        self.backend
            .insert_documents(vec![(id, document)], self.name())
            .await?;

        Ok(id)
    }

    /// Retrieves documents by ID. Missing IDs are omitted.
    pub async fn get(&self, ids: Vec<Uuid>) -> DocumentStoreResult<Vec<Document>> {
        self.backend.get_documents(ids, self.name()).await
    }

    /// Collects every document matching `query`.
    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.backend.query_documents(query, self.name()).await
    }

    /// Streams the documents matching `query` in store order.
    pub async fn stream(&self, query: Query) -> DocumentStoreResult<DocumentStream> {
        self.backend.stream_documents(query, self.name()).await
    }

    /// Sets `fields` on documents matching `filter`, without any schema checks.
    pub async fn update(
        &self,
        filter: Option<Expr>,
        fields: Document,
        multi: bool,
    ) -> DocumentStoreResult<UpdateResult> {
        self.backend
            .update_documents(filter, fields, multi, self.name())
            .await
    }
}
