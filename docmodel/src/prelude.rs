//! Convenient re-exports of commonly used types from docmodel.
//!
//! ```ignore
//! use docmodel::prelude::*;
//! ```

pub use docmodel_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    collection::Collection,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult, FieldError, FieldErrorKind, ValidationError},
    model::{Model, ModelCollection},
    populate::Expansion,
    query::{Expr, FieldOp, Filter, Query},
    raw::{RawAccess, RawCursor},
    schema::{FieldDef, FieldType, Schema, Validator},
    store::DocumentStore,
    update::{UpdateOptions, UpdateResult},
};
