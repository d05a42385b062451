//! Main docmodel crate providing raw and schema-checked access to document stores.
//!
//! This crate is the primary entry point. It re-exports the core types from
//! `docmodel-core` and gives access to the available storage backends.
//!
//! # Features
//!
//! - **Raw access** - One connection per operation, documents stored as given
//! - **Modeled access** - Declared schemas with required, type, nested and custom rules
//! - **Partial updates** - Unchecked or validated, first match or every match
//! - **Reference expansion** - Weak references resolved only when asked for
//! - **Multiple backends** - In-memory and MongoDB behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let kittens = store.model::<Kitten>();
//!
//! match kittens.save(doc! { "name": "   ", "age": "a" }).await {
//!     Err(DocumentStoreError::Validation(error)) => println!("{error}"),
//!     other => println!("{other:?}"),
//! }
//!
//! kittens
//!     .update(None, doc! { "name": "Mr. Floof" }, UpdateOptions::validated())
//!     .await?;
//!
//! let yoda = kittens
//!     .find_expanded(Query::filtered(Filter::eq("name", "Yoda")), &Expansion::parse("owner"))
//!     .await?;
//! ```
//!
//! # Raw access
//!
//! ```ignore
//! use docmodel::{raw::RawAccess, memory::InMemoryStore};
//!
//! let raw = RawAccess::new(InMemoryStore::new().connector());
//! let mut cursor = raw.find_by_field("restaurants", "borough", "Manhattan").await?;
//! while let Some(document) = cursor.try_next().await? {
//!     println!("{document}");
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docmodel_core::{
    backend, collection, document, error, model, populate, query, raw, schema, store, update, validate,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmodel_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmodel_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
