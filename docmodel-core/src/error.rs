//! Error types and result types for document store operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`].
//! Schema failures are collected into a single [`ValidationError`] keyed by
//! field path rather than reported one at a time.

use bson::{Bson, error::Error as BsonError};
use serde::Serialize;
use serde_json::Error as SerdeJsonError;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error while building a backend from its configuration.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The store could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The document has an invalid structure (for example a malformed `_id`).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The query could not be evaluated (for example an invalid pattern).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// One or more schema rules failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An error reported by the underlying storage backend, passed through unchanged.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Short, stable name of the error kind, suitable for response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentStoreError::Serialization(_) => "SerializationError",
            DocumentStoreError::Initialization(_) => "InitializationError",
            DocumentStoreError::Connection(_) => "ConnectionError",
            DocumentStoreError::DocumentAlreadyExists(..) => "DocumentAlreadyExists",
            DocumentStoreError::InvalidDocument(_) => "InvalidDocument",
            DocumentStoreError::InvalidQuery(_) => "InvalidQuery",
            DocumentStoreError::Validation(_) => "ValidationError",
            DocumentStoreError::Backend(_) => "StoreOperationError",
        }
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

/// Which rule produced a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    /// The field was absent, null or blank.
    Required,
    /// The value could not be coerced to the declared type.
    Cast,
    /// A custom validator rejected the value.
    Validator,
}

/// A single failed rule, scoped to one field path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    /// Dotted path of the field, e.g. `name.first`.
    pub path: String,
    pub message: String,
    /// The offending input value (`null` when the field was missing).
    pub value: Bson,
}

/// Aggregated schema failures for one save or validated update.
///
/// Holds at most one [`FieldError`] per path. The map is ordered by path so
/// that rendered messages are stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub model: String,
    pub errors: BTreeMap<String, FieldError>,
}

impl ValidationError {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), errors: BTreeMap::new() }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.entry(error.path.clone()).or_insert(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.errors.get(path)
    }

    /// Returns `Ok(())` when no rule failed, otherwise the aggregated error.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed", self.model)?;

        for (i, (path, error)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{path}: {}", error.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
