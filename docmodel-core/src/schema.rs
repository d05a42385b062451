//! Per-field constraint descriptors for schema-checked collections.
//!
//! A [`Schema`] is an ordered list of [`FieldDef`]s. Each field carries a
//! type (used for lenient coercion), an optional [`Required`] rule and any
//! number of custom [`Validator`]s. Rules are independent descriptors; the
//! [`validate`](crate::validate) module evaluates all of them and merges the
//! failures into one [`ValidationError`](crate::error::ValidationError).
//!
//! ```ignore
//! use docmodel::schema::{FieldDef, Schema, Validator};
//!
//! let kitten = Schema::new()
//!     .field(
//!         FieldDef::string("name")
//!             .required_with("All kittens need names!")
//!             .validate(Validator::not_blank("`{VALUE}` is not a valid name!")),
//!     )
//!     .field(FieldDef::number("age").required_with("Why no age?"))
//!     .field(FieldDef::reference("owner", "people"));
//! ```

use bson::Bson;
use std::{fmt, sync::Arc};

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Weak reference: stores the UUID of a document in the named collection.
    Reference(&'static str),
    /// Nested paths declared inline. Sub-fields are always evaluated; an
    /// absent parent is treated as an empty document.
    Object(Schema),
    /// A sub-document with its own schema, evaluated only when present.
    Embedded(Schema),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Reference(_) => "Reference",
            FieldType::Object(_) => "Object",
            FieldType::Embedded(_) => "Embedded",
        }
    }

    /// Schema of the nested document, if this is a nested type.
    pub fn nested(&self) -> Option<&Schema> {
        match self {
            FieldType::Object(schema) | FieldType::Embedded(schema) => Some(schema),
            _ => None,
        }
    }
}

/// The required-field rule.
///
/// Fails when the value is absent, `null`, or a string that is empty after
/// trimming. The message may use `{PATH}` and `{VALUE}`.
#[derive(Debug, Clone)]
pub struct Required {
    pub message: String,
}

impl Default for Required {
    fn default() -> Self {
        Self { message: "Path `{PATH}` is required.".to_string() }
    }
}

type Predicate = Arc<dyn Fn(&Bson) -> bool + Send + Sync>;

/// A custom predicate over a field's coerced value.
///
/// Runs only after the required rule and type coercion have passed.
#[derive(Clone)]
pub struct Validator {
    predicate: Predicate,
    message: String,
}

impl Validator {
    /// Creates a validator; `message` may use `{PATH}` and `{VALUE}`.
    pub fn new(predicate: impl Fn(&Bson) -> bool + Send + Sync + 'static, message: impl Into<String>) -> Self {
        Self { predicate: Arc::new(predicate), message: message.into() }
    }

    /// Accepts strings with at least one non-whitespace character.
    pub fn not_blank(message: impl Into<String>) -> Self {
        Self::new(
            |value| value.as_str().is_some_and(|s| !s.trim().is_empty()),
            message,
        )
    }

    pub fn check(&self, value: &Bson) -> bool {
        (self.predicate)(value)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// One declared field and its rules.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub required: Option<Required>,
    pub validators: Vec<Validator>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, required: None, validators: Vec::new() }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn reference(name: impl Into<String>, collection: &'static str) -> Self {
        Self::new(name, FieldType::Reference(collection))
    }

    pub fn object(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldType::Object(schema))
    }

    pub fn embedded(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldType::Embedded(schema))
    }

    /// Marks the field required with the default message.
    pub fn required(mut self) -> Self {
        self.required = Some(Required::default());
        self
    }

    /// Marks the field required with a custom message.
    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = Some(Required { message: message.into() });
        self
    }

    /// Sets or clears the required rule, keeping the default message.
    pub fn required_if(self, required: bool) -> Self {
        if required { self.required() } else { self.optional() }
    }

    pub fn optional(mut self) -> Self {
        self.required = None;
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }
}

/// An ordered set of field declarations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing an earlier declaration with the same name.
    pub fn field(mut self, def: FieldDef) -> Self {
        match self.fields.iter_mut().find(|f| f.name == def.name) {
            Some(existing) => *existing = def,
            None => self.fields.push(def),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolves a dotted path (`name.first`) through nested schemas.
    pub fn resolve(&self, path: &str) -> Option<&FieldDef> {
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => self.get(head)?.field_type.nested()?.resolve(rest),
        }
    }

    /// Names of fields declared as weak references, with their target collections.
    pub fn references(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.fields.iter().filter_map(|f| match f.field_type {
            FieldType::Reference(collection) => Some((f.name.as_str(), collection)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Schema {
        Schema::new()
            .field(FieldDef::object(
                "name",
                Schema::new()
                    .field(FieldDef::string("first").required())
                    .field(FieldDef::string("last").required()),
            ))
            .field(FieldDef::number("age"))
    }

    #[test]
    fn resolves_nested_paths() {
        let schema = person();

        assert!(schema.resolve("name.first").is_some_and(FieldDef::is_required));
        assert!(schema.resolve("age").is_some());
        assert!(schema.resolve("age.years").is_none());
        assert!(schema.resolve("color").is_none());
    }

    #[test]
    fn redeclaring_a_field_replaces_it() {
        let schema = person().field(FieldDef::number("age").required());

        assert_eq!(schema.fields().count(), 2);
        assert!(schema.get("age").is_some_and(FieldDef::is_required));
    }

    #[test]
    fn not_blank_rejects_whitespace() {
        let validator = Validator::not_blank("`{VALUE}` is not a valid name!");

        assert!(validator.check(&Bson::from("Yoda")));
        assert!(!validator.check(&Bson::from("   ")));
        assert!(!validator.check(&Bson::Int32(3)));
    }
}
