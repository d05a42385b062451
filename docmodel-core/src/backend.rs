//! Storage backend abstraction for the document store.
//!
//! [`StoreBackend`] is the single storage-access interface shared by the raw
//! (unchecked) and modeled (schema-checked) access layers. Backends store
//! BSON documents whose identity lives in the `_id` field and give dotted
//! field paths the same meaning when filtering and updating.
//!
//! [`StoreBackendBuilder`] opens a backend. The raw access layer calls it once
//! per operation; the modeled layer calls it once at startup.
//!
//! # Examples
//!
//! ```ignore
//! use docmodel::backend::StoreBackend;
//! use bson::{Uuid, doc};
//!
//! let backend = MyBackendImpl::new();
//! let id = Uuid::new();
//! backend.insert_documents(vec![(id, doc! { "_id": id, "name": "Vella" })], "restaurants").await?;
//! ```

use async_trait::async_trait;
use bson::{Document, Uuid};
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Expr, Query},
    update::UpdateResult,
};

/// A lazy, finite, one-shot sequence of documents in store order.
pub type DocumentStream = BoxStream<'static, DocumentStoreResult<Document>>;

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks. The store provides no locking or transaction
/// discipline beyond what each single call guarantees.
///
/// # Error Handling
///
/// An unreachable store is reported as
/// [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection);
/// any other store-reported failure is passed through as
/// [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Round-trips to the store to prove the connection is usable.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Inserts new documents into a collection.
    ///
    /// Each document must already carry `_id` equal to its paired UUID.
    /// The collection is created on first use. Inserting an existing ID fails
    /// with [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists)
    /// or a backend error.
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Document)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Retrieves documents by ID. Missing IDs are omitted from the result.
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Runs a query and collects every matching document.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Runs a query and returns the matches as a stream.
    ///
    /// The stream must not borrow the backend; it may outlive the call that
    /// created it but not the connection itself.
    async fn stream_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<DocumentStream>;

    /// Sets `fields` (dotted paths allowed) on documents matching `filter`.
    ///
    /// A `None` filter matches every document. With `multi == false` only the
    /// first match in store order is updated. No schema is consulted here.
    async fn update_documents(
        &self,
        filter: Option<Expr>,
        fields: Document,
        multi: bool,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Cleanly shuts down the backend, releasing its connection.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for backend instances.
///
/// Builders are cheap to clone so a single configured builder can open one
/// connection per operation.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend + 'static;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
