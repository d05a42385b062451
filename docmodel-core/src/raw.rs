//! Connection-per-call access without a schema.
//!
//! [`RawAccess`] holds only a configured [`StoreBackendBuilder`]. Each call
//! opens a fresh backend, performs one operation and closes it again. Finds
//! hand the open backend to a [`RawCursor`], which closes it once the results
//! are exhausted.
//!
//! ```ignore
//! let raw = RawAccess::new(connector);
//! raw.test_connection().await?;
//!
//! let mut cursor = raw.find_by_nested_field("restaurants", "address.zipcode", "10075").await?;
//! while let Some(document) = cursor.try_next().await? {
//!     println!("{document}");
//! }
//! ```

use bson::{Bson, Document, Uuid};
use futures::StreamExt;

use crate::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    document::ensure_id,
    error::DocumentStoreResult,
    query::{Expr, Filter, Query},
};

/// Unchecked access that opens one connection per operation.
#[derive(Debug, Clone)]
pub struct RawAccess<C> {
    connector: C,
}

impl<C> RawAccess<C>
where
    C: StoreBackendBuilder + Clone,
{
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Opens a connection, round-trips to the store and closes it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection)
    /// when the store is unreachable.
    pub async fn test_connection(&self) -> DocumentStoreResult<()> {
        let backend = self.connector.clone().build().await?;
        let pinged = backend.ping().await;
        let closed = backend.shutdown().await;

        pinged.and(closed)
    }

    /// Inserts one document as-is and returns its `_id`, generating it when absent.
    pub async fn insert_one(&self, collection: &str, document: Document) -> DocumentStoreResult<Uuid> {
        let (id, document) = ensure_id(document)?;
        let backend = self.connector.clone().build().await?;
        let inserted = backend.insert_documents(vec![(id, document)], collection).await;
        let closed = backend.shutdown().await;

        inserted.and(closed).map(|_| id)
    }

    /// Opens a cursor over the documents matching `filter` (all when `None`).
    pub async fn find(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> DocumentStoreResult<RawCursor<C::Backend>> {
        let query = filter.map(Query::filtered).unwrap_or_else(Query::all);
        let backend = self.connector.clone().build().await?;

        match backend.stream_documents(query, collection).await {
            Ok(stream) => Ok(RawCursor { backend: Some(backend), stream: Some(stream) }),
            Err(error) => {
                if let Err(close_error) = backend.shutdown().await {
                    tracing::warn!(error = %close_error, "failed to close connection after a failed find");
                }
                Err(error)
            }
        }
    }

    pub async fn find_all(&self, collection: &str) -> DocumentStoreResult<RawCursor<C::Backend>> {
        self.find(collection, None).await
    }

    /// Exact match on a top-level field.
    pub async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<RawCursor<C::Backend>> {
        self.find(collection, Some(Filter::eq(field, value))).await
    }

    /// Exact match on a dotted path into a nested document.
    pub async fn find_by_nested_field(
        &self,
        collection: &str,
        path: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<RawCursor<C::Backend>> {
        self.find(collection, Some(Filter::eq(path, value))).await
    }

    /// Matches documents where any element of an array has `path` equal to `value`.
    pub async fn find_by_array_element_field(
        &self,
        collection: &str,
        path: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<RawCursor<C::Backend>> {
        self.find(collection, Some(Filter::eq(path, value))).await
    }
}

/// A one-shot, forward-only sequence of documents that owns its connection.
///
/// The connection is closed when the sequence is exhausted, on the first
/// error, or by an explicit [`close`](Self::close).
pub struct RawCursor<B: StoreBackend> {
    backend: Option<B>,
    stream: Option<DocumentStream>,
}

impl<B: StoreBackend> RawCursor<B> {
    /// Returns the next document, or `None` once the results are exhausted.
    pub async fn try_next(&mut self) -> DocumentStoreResult<Option<Document>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        match stream.next().await {
            Some(Ok(document)) => Ok(Some(document)),
            Some(Err(error)) => {
                if let Err(close_error) = self.close().await {
                    tracing::warn!(error = %close_error, "failed to close connection after a read error");
                }
                Err(error)
            }
            None => {
                self.close().await?;
                Ok(None)
            }
        }
    }

    /// Closes the connection. Later calls to [`try_next`](Self::try_next) yield `None`.
    pub async fn close(&mut self) -> DocumentStoreResult<()> {
        // A driver cursor holds the client open; it must be gone before shutdown.
        drop(self.stream.take());

        match self.backend.take() {
            Some(backend) => backend.shutdown().await,
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }
}

impl<B: StoreBackend> std::fmt::Debug for RawCursor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCursor")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
