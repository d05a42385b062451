//! Evaluation of schema rules against BSON input.
//!
//! Every declared field is checked independently: required first, then type
//! coercion, then custom validators. At most one failure is recorded per
//! path, and all failures are merged into a single [`ValidationError`].
//! Successful evaluation yields the document to persist: declared fields only,
//! with coerced values.

use bson::{Bson, Document};

use crate::{
    document::uuid_from_bson,
    error::{FieldError, FieldErrorKind, ValidationError},
    schema::{FieldDef, FieldType, Schema},
};

/// Checks documents against a schema on behalf of a named model.
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'a> {
    model: &'a str,
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(model: &'a str, schema: &'a Schema) -> Self {
        Self { model, schema }
    }

    /// Validates a whole document, as done on save.
    ///
    /// Every declared field is evaluated, recursing into nested schemas.
    /// Fields not declared in the schema are left out of the returned document.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`ValidationError`] if any rule failed.
    pub fn validate_document(&self, input: &Document) -> Result<Document, ValidationError> {
        let mut errors = ValidationError::new(self.model);
        let output = check_schema(self.schema, Some(input), "", &mut errors);

        errors.into_result().map(|()| output)
    }

    /// Validates only the fields present in a partial update.
    ///
    /// Keys may be dotted paths into nested schemas. Undeclared keys are
    /// dropped from the returned field set.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`ValidationError`] if any rule failed.
    pub fn validate_fields(&self, fields: &Document) -> Result<Document, ValidationError> {
        let mut errors = ValidationError::new(self.model);
        let mut output = Document::new();

        for (path, value) in fields {
            let Some(def) = self.schema.resolve(path) else {
                continue;
            };

            if let Some(value) = check_field(def, Some(value), path, &mut errors) {
                output.insert(path.clone(), value);
            }
        }

        errors.into_result().map(|()| output)
    }
}

fn check_schema(
    schema: &Schema,
    input: Option<&Document>,
    prefix: &str,
    errors: &mut ValidationError,
) -> Document {
    let mut output = Document::new();

    for def in schema.fields() {
        let path = if prefix.is_empty() {
            def.name.clone()
        } else {
            format!("{prefix}.{}", def.name)
        };

        if let Some(value) = check_field(def, input.and_then(|d| d.get(&def.name)), &path, errors) {
            output.insert(def.name.clone(), value);
        }
    }

    output
}

fn check_field(
    def: &FieldDef,
    value: Option<&Bson>,
    path: &str,
    errors: &mut ValidationError,
) -> Option<Bson> {
    let Some(value) = value.filter(|v| !is_missing(v, def.is_required())) else {
        if let Some(required) = &def.required {
            let value = value.cloned().unwrap_or(Bson::Null);
            errors.push(FieldError {
                kind: FieldErrorKind::Required,
                path: path.to_string(),
                message: render(&required.message, path, &value),
                value,
            });
            return None;
        }

        // Inline nested paths are evaluated even without a parent value.
        if let FieldType::Object(schema) = &def.field_type {
            let nested = check_schema(schema, None, path, errors);
            return (!nested.is_empty()).then_some(Bson::Document(nested));
        }

        return None;
    };

    let coerced = match cast(&def.field_type, value) {
        Cast::Value(coerced) => coerced,
        Cast::Empty => return None,
        Cast::Failed => {
            errors.push(FieldError {
                kind: FieldErrorKind::Cast,
                path: path.to_string(),
                message: format!(
                    "Cast to {} failed for value \"{}\" at path \"{path}\"",
                    def.field_type.name(),
                    display_value(value),
                ),
                value: value.clone(),
            });
            return None;
        }
    };

    let coerced = match (&def.field_type, coerced) {
        (FieldType::Object(schema) | FieldType::Embedded(schema), Bson::Document(doc)) => {
            Bson::Document(check_schema(schema, Some(&doc), path, errors))
        }
        (_, coerced) => coerced,
    };

    if let Some(validator) = def.validators.iter().find(|v| !v.check(&coerced)) {
        errors.push(FieldError {
            kind: FieldErrorKind::Validator,
            path: path.to_string(),
            message: render(validator.message(), path, &coerced),
            value: coerced,
        });
        return None;
    }

    match coerced {
        Bson::Document(doc) if doc.is_empty() => None,
        coerced => Some(coerced),
    }
}

/// Absent values are `null`; for required fields blank strings count too.
fn is_missing(value: &Bson, required: bool) -> bool {
    match value {
        Bson::Null | Bson::Undefined => true,
        Bson::String(s) => required && s.trim().is_empty(),
        _ => false,
    }
}

enum Cast {
    Value(Bson),
    /// The input coerces to "no value" (a blank string for a number).
    Empty,
    Failed,
}

fn cast(field_type: &FieldType, value: &Bson) -> Cast {
    match field_type {
        FieldType::String => match value {
            Bson::String(_) => Cast::Value(value.clone()),
            Bson::Int32(n) => Cast::Value(Bson::String(n.to_string())),
            Bson::Int64(n) => Cast::Value(Bson::String(n.to_string())),
            Bson::Double(n) => Cast::Value(Bson::String(n.to_string())),
            Bson::Boolean(b) => Cast::Value(Bson::String(b.to_string())),
            _ => Cast::Failed,
        },
        FieldType::Number => match value {
            Bson::Int32(_) | Bson::Int64(_) => Cast::Value(value.clone()),
            Bson::Double(n) if n.is_finite() => Cast::Value(value.clone()),
            Bson::Boolean(b) => Cast::Value(Bson::Int32(i32::from(*b))),
            Bson::String(s) => parse_number(s.trim()),
            _ => Cast::Failed,
        },
        FieldType::Boolean => match value {
            Bson::Boolean(_) => Cast::Value(value.clone()),
            Bson::Int32(n @ (0 | 1)) => Cast::Value(Bson::Boolean(*n == 1)),
            Bson::Int64(n @ (0 | 1)) => Cast::Value(Bson::Boolean(*n == 1)),
            Bson::String(s) => match s.trim() {
                "true" | "1" | "yes" => Cast::Value(Bson::Boolean(true)),
                "false" | "0" | "no" => Cast::Value(Bson::Boolean(false)),
                _ => Cast::Failed,
            },
            _ => Cast::Failed,
        },
        FieldType::Reference(_) => match uuid_from_bson(value) {
            Some(id) => Cast::Value(Bson::from(id)),
            None => Cast::Failed,
        },
        FieldType::Object(_) | FieldType::Embedded(_) => match value {
            Bson::Document(_) => Cast::Value(value.clone()),
            _ => Cast::Failed,
        },
    }
}

fn parse_number(s: &str) -> Cast {
    if s.is_empty() {
        return Cast::Empty;
    }

    if let Ok(n) = s.parse::<i64>() {
        return Cast::Value(match i32::try_from(n) {
            Ok(n) => Bson::Int32(n),
            Err(_) => Bson::Int64(n),
        });
    }

    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Cast::Value(Bson::Double(n)),
        _ => Cast::Failed,
    }
}

fn display_value(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render(template: &str, path: &str, value: &Bson) -> String {
    template
        .replace("{PATH}", path)
        .replace("{VALUE}", &display_value(value))
}
