//! Core traits for typed documents and their BSON conversions.
//!
//! Stored documents always carry their identity in the `_id` field. Typed
//! documents map that field onto a [`Uuid`] and name the collection they live in.

use bson::{Bson, Document as BsonDocument, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identity field inside every stored document.
pub const ID_FIELD: &str = "_id";

/// Core trait that all typed documents must implement.
///
/// # Example
///
/// ```ignore
/// use docmodel::document::Document;
/// use bson::Uuid;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Puppy {
///     #[serde(rename = "_id")]
///     pub id: Uuid,
///     pub name: Option<String>,
/// }
///
/// impl Document for Puppy {
///     fn id(&self) -> &Uuid {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "puppies"
///     }
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns a reference to this document's unique identifier.
    fn id(&self) -> &Uuid;

    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;
}

/// Extension trait providing BSON conversions for documents.
///
/// Automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or does not produce a document.
    fn to_document(&self) -> DocumentStoreResult<BsonDocument>;

    /// Creates a typed document from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: BsonDocument) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_document(&self) -> DocumentStoreResult<BsonDocument> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "{} did not serialize to a document (got {:?})",
                D::collection_name(),
                other.element_type()
            ))),
        }
    }

    fn from_document(document: BsonDocument) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}

/// Reads a UUID out of a BSON value.
///
/// Accepts binary values of the UUID subtype and UUID strings.
pub fn uuid_from_bson(value: &Bson) -> Option<Uuid> {
    match value {
        Bson::Binary(binary) if binary.subtype == bson::spec::BinarySubtype::Uuid => {
            <[u8; 16]>::try_from(binary.bytes.as_slice())
                .ok()
                .map(Uuid::from_bytes)
        }
        Bson::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

/// Returns the identity of a stored document, generating and inserting one when absent.
///
/// The `_id` is moved to the front of the document.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if `_id` is present but is not a UUID.
pub fn ensure_id(document: BsonDocument) -> DocumentStoreResult<(Uuid, BsonDocument)> {
    let id = match document.get(ID_FIELD) {
        Some(value) => uuid_from_bson(value).ok_or_else(|| {
            DocumentStoreError::InvalidDocument(format!("`{ID_FIELD}` must be a UUID, got {value}"))
        })?,
        None => Uuid::new(),
    };

    Ok((id, with_id(id, document)))
}

/// Places `id` at the front of `document`, replacing any existing `_id`.
pub fn with_id(id: Uuid, document: BsonDocument) -> BsonDocument {
    std::iter::once((ID_FIELD.to_string(), Bson::from(id)))
        .chain(document.into_iter().filter(|(k, _)| k != ID_FIELD))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn ensure_id_generates_missing_identity() {
        let (id, document) = ensure_id(doc! { "name": "Vella" }).unwrap();

        assert_eq!(document.keys().next().map(String::as_str), Some(ID_FIELD));
        assert_eq!(uuid_from_bson(document.get(ID_FIELD).unwrap()), Some(id));
    }

    #[test]
    fn ensure_id_keeps_string_identity() {
        let id = Uuid::new();
        let (parsed, document) = ensure_id(doc! { "name": "Keith", "_id": id.to_string() }).unwrap();

        assert_eq!(parsed, id);
        assert_eq!(document.get(ID_FIELD), Some(&Bson::from(id)));
        assert_eq!(document.len(), 2);
    }

    #[test]
    fn ensure_id_rejects_foreign_identity() {
        let result = ensure_id(doc! { "_id": 42 });

        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }
}
