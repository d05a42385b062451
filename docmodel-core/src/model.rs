//! Schema-checked access to a model's collection.
//!
//! A [`Model`] is a typed document with a declared [`Schema`]. Its
//! [`ModelCollection`] validates whole documents on save, optionally
//! validates partial updates, and resolves weak references on request.
//!
//! Save and update deliberately differ: save keeps only declared fields,
//! while a default-mode update writes whatever fields it is given.
//!
//! ```ignore
//! let kittens = store.model::<Kitten>();
//! let saved = kittens.save(doc! { "name": "yoda", "age": "12", "color": "white" }).await?;
//! assert_eq!(saved.get("age"), Some(&Bson::Int32(12)));
//! assert!(!saved.contains_key("color"));
//! ```

use bson::{Document, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    collection::Collection,
    document::{Document as TypedDocument, DocumentExt, ID_FIELD, uuid_from_bson, with_id},
    error::{DocumentStoreResult, FieldError, FieldErrorKind, ValidationError},
    populate::{self, Expansion},
    query::{Expr, Query},
    schema::Schema,
    update::{UpdateOptions, UpdateResult},
    validate::SchemaValidator,
};

/// A typed document with a declared schema.
pub trait Model: TypedDocument {
    /// Name used in validation messages, e.g. `Kitten`.
    fn model_name() -> &'static str;

    /// The rules checked before documents of this model are persisted.
    fn schema() -> Schema;
}

/// A schema-checked collection for model `M`.
#[derive(Debug)]
pub struct ModelCollection<'a, B: StoreBackend, M: Model> {
    collection: Collection<'a, B>,
    backend: &'a B,
    schema: Schema,
    _marker: PhantomData<M>,
}

impl<'a, B: StoreBackend, M: Model> ModelCollection<'a, B, M> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self {
            collection: Collection::new(M::collection_name().to_string(), backend),
            backend,
            schema: M::schema(),
            _marker: PhantomData,
        }
    }

    /// Uses `schema` instead of the model's declared schema.
    ///
    /// Lets one collection be exercised under several rule configurations.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Validates `input` and persists the declared fields.
    ///
    /// The `_id` is taken from the input when present, otherwise generated.
    /// Input fields missing from the schema are discarded without error.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Validation`](crate::error::DocumentStoreError::Validation)
    /// with one entry per failing path; nothing is written in that case.
    pub async fn save(&self, input: Document) -> DocumentStoreResult<Document> {
        let validated = SchemaValidator::new(M::model_name(), &self.schema).validate_document(&input);
        let id = match input.get(ID_FIELD) {
            None => Ok(Uuid::new()),
            Some(value) => uuid_from_bson(value).ok_or(value),
        };

        let (validated, id) = match (validated, id) {
            (Ok(validated), Ok(id)) => (validated, id),
            (validated, id) => {
                let mut error = validated.err().unwrap_or_else(|| ValidationError::new(M::model_name()));
                if let Err(value) = id {
                    error.push(FieldError {
                        kind: FieldErrorKind::Cast,
                        path: ID_FIELD.to_string(),
                        message: format!("Cast to UUID failed for value \"{value}\" at path \"{ID_FIELD}\""),
                        value: value.clone(),
                    });
                }
                tracing::debug!(model = M::model_name(), %error, "save rejected");
                return Err(error.into());
            }
        };

        let dropped = input
            .keys()
            .filter(|k| k.as_str() != ID_FIELD && self.schema.get(k).is_none())
            .collect::<Vec<_>>();
        if !dropped.is_empty() {
            tracing::debug!(model = M::model_name(), ?dropped, "discarding undeclared fields");
        }

        let document = with_id(id, validated);
        self.backend
            .insert_documents(vec![(id, document.clone())], self.name())
            .await?;

        Ok(document)
    }

    /// Saves a typed model value and returns it as stored.
    pub async fn create(&self, model: &M) -> DocumentStoreResult<M> {
        M::from_document(self.save(model.to_document()?).await?)
    }

    /// Retrieves typed documents by ID. Missing IDs are omitted.
    pub async fn get(&self, ids: Vec<Uuid>) -> DocumentStoreResult<Vec<M>> {
        self.collection
            .get(ids)
            .await?
            .into_iter()
            .map(M::from_document)
            .collect()
    }

    /// Returns the stored documents matching `query`, exactly as stored.
    pub async fn find(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.collection.find(query).await
    }

    /// Like [`find`](Self::find), then resolves the reference fields named by `expansion`.
    pub async fn find_expanded(
        &self,
        query: Query,
        expansion: &Expansion,
    ) -> DocumentStoreResult<Vec<Document>> {
        let mut documents = self.collection.find(query).await?;

        if !expansion.is_empty() {
            populate::resolve(self.backend, &self.schema, expansion, &mut documents).await?;
        }

        Ok(documents)
    }

    /// Applies a partial update to documents matching `filter`.
    ///
    /// In default mode the fields are written as given, declared or not.
    /// With [`UpdateOptions::run_validators`] only the present fields are
    /// checked and undeclared fields are dropped. Unless
    /// [`UpdateOptions::multi`] is set, only the first match is updated.
    ///
    /// # Errors
    ///
    /// Returns a validation error in validated mode, otherwise any store error.
    pub async fn update(
        &self,
        filter: Option<Expr>,
        fields: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<UpdateResult> {
        let fields = if options.run_validators {
            SchemaValidator::new(M::model_name(), &self.schema).validate_fields(&fields)?
        } else {
            fields
        };

        if fields.is_empty() {
            tracing::debug!(model = M::model_name(), "update has no fields to set");
            return Ok(UpdateResult::default());
        }

        self.collection.update(filter, fields, options.multi).await
    }
}
