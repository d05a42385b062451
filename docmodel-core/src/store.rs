//! Main document store interface for interacting with document backends.
//!
//! A [`DocumentStore`] owns one backend connection and hands out two kinds of
//! collection handles over it:
//!
//! - [`Collection`] - unchecked access by collection name
//! - [`ModelCollection`] - schema-checked access for a [`Model`]
//!
//! # Example
//!
//! ```ignore
//! use docmodel::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! store.ping().await?;
//! let kittens = store.model::<Kitten>();
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::DocumentStoreResult,
    model::{Model, ModelCollection},
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets an unchecked collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Gets the schema-checked collection for model `M`.
    ///
    /// The collection name and schema come from the model type.
    pub fn model<'a, M: Model>(&'a self) -> ModelCollection<'a, B, M> {
        ModelCollection::new(&self.backend)
    }

    /// Verifies the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection)
    /// if the store cannot be reached.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}
