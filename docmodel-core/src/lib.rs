//! A document access layer with two conformance modes over one storage interface.
//!
//! This crate is the core of the docmodel project and provides:
//!
//! - **Document traits** ([`document`]) - Typed documents and `_id` handling
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query and filtering API** ([`query`]) - Filters over top-level, nested and array-element fields
//! - **Unchecked collections** ([`collection`]) - Documents passed through as-is
//! - **Schemas** ([`schema`], [`validate`]) - Required, type, nested and custom rules
//! - **Modeled collections** ([`model`]) - Schema-checked save and partial update
//! - **Reference expansion** ([`populate`]) - Opt-in resolution of weak references
//! - **Raw access** ([`raw`]) - One connection per operation, streaming cursors
//! - **Document store** ([`store`]) - A long-lived backend and its collections
//! - **Error handling** ([`error`]) - Store errors and aggregated validation errors
//!
//! # Example
//!
//! ```ignore
//! use docmodel::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Puppy {
//!     #[serde(rename = "_id")]
//!     pub id: Uuid,
//!     pub name: Option<String>,
//!     pub age: Option<f64>,
//! }
//!
//! impl Document for Puppy {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "puppies"
//!     }
//! }
//!
//! impl Model for Puppy {
//!     fn model_name() -> &'static str {
//!         "Puppy"
//!     }
//!
//!     fn schema() -> Schema {
//!         Schema::new()
//!             .field(FieldDef::string("name"))
//!             .field(FieldDef::number("age"))
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod model;
pub mod populate;
pub mod query;
pub mod raw;
pub mod schema;
pub mod store;
pub mod update;
pub mod validate;
