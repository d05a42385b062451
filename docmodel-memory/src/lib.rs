//! In-memory document storage backend for docmodel.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and backs the test suites
//! and the default server configuration.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion order** - Collections iterate in the order documents were inserted
//! - **Path queries** - Dot paths into nested documents and through arrays
//! - **Partial updates** - Dotted `$set`-style updates on the first or every match
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{DocumentStore, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let kittens = store.model::<Kitten>();
//! kittens.save(doc! { "name": "fluffy", "age": 2 }).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
