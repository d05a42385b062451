//! Opt-in resolution of weak references.
//!
//! A reference field stores the UUID of a document in another collection.
//! Nothing resolves it automatically: callers name the fields to expand and
//! pay one lookup per expanded field per document. A reference whose target
//! does not exist resolves to `null`.

use bson::{Bson, Document};
use std::collections::HashMap;

use crate::{
    backend::StoreBackend,
    document::uuid_from_bson,
    error::DocumentStoreResult,
    schema::Schema,
};

/// The set of reference fields to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    fields: Vec<String>,
}

impl Expansion {
    /// Expands nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a whitespace-separated list of field names. An empty string expands nothing.
    pub fn parse(paths: &str) -> Self {
        Self {
            fields: paths.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Replaces the expanded reference fields of `documents` with their targets.
///
/// Names that the schema does not declare as references are ignored.
pub(crate) async fn resolve<B: StoreBackend>(
    backend: &B,
    schema: &Schema,
    expansion: &Expansion,
    documents: &mut [Document],
) -> DocumentStoreResult<()> {
    let references = schema.references().collect::<HashMap<_, _>>();

    for field in expansion.fields() {
        let Some(collection) = references.get(field).copied() else {
            tracing::debug!(field, "ignoring expansion of a non-reference field");
            continue;
        };

        for document in documents.iter_mut() {
            let Some(id) = document.get(field).and_then(uuid_from_bson) else {
                continue;
            };

            let target = backend
                .get_documents(vec![id], collection)
                .await?
                .into_iter()
                .next()
                .map(Bson::Document)
                .unwrap_or(Bson::Null);

            document.insert(field, target);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_expands_nothing() {
        assert!(Expansion::parse("").is_empty());
        assert!(Expansion::parse("   ").is_empty());
        assert_eq!(Expansion::parse("owner"), Expansion::none().field("owner"));
        assert_eq!(Expansion::parse("owner  vet").fields().count(), 2);
    }
}
