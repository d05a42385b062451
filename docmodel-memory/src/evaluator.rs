//! Query expression evaluation for in-memory document filtering.
//!
//! Field names are resolved as dot paths. Arrays met along a path are
//! traversed element by element, and an array at the end of a path matches
//! through any of its elements as well as through the whole array.
//!
//! A filter is compiled once per query into a [`DocumentFilter`]; patterns
//! are parsed at that point, so an invalid one fails the query before any
//! document is read.

use std::collections::HashMap;
use bson::{Bson, Document, datetime::DateTime};
use regex::Regex;

use docmodel_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased representation of BSON values for equality checks.
///
/// Numeric types are normalized to f64 so that `12` and `12.0` compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    /// Binary payloads, including UUIDs.
    Bytes(&'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Bytes(&binary.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// Collects every value reachable from `document` through the dotted `path`.
pub(crate) fn path_values<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments = path.split('.').collect::<Vec<_>>();
    let mut values = Vec::new();

    if let Some((head, rest)) = segments.split_first() {
        if let Some(value) = document.get(*head) {
            collect(value, rest, &mut values);
        }
    }

    values
}

fn collect<'a>(value: &'a Bson, path: &[&str], out: &mut Vec<&'a Bson>) {
    match path.split_first() {
        None => {
            if let Bson::Array(items) = value {
                out.extend(items.iter());
            }
            out.push(value);
        }
        Some((head, rest)) => match value {
            Bson::Document(document) => {
                if let Some(next) = document.get(*head) {
                    collect(next, rest, out);
                }
            }
            Bson::Array(items) => {
                for item in items.iter().filter(|item| matches!(item, Bson::Document(_))) {
                    collect(item, path, out);
                }
            }
            _ => {}
        },
    }
}


/// A filter expression prepared for evaluation against many documents.
#[derive(Debug)]
pub(crate) enum DocumentFilter {
    All,
    And(Vec<DocumentFilter>),
    Eq { field: String, value: Bson },
    Matches { field: String, regex: Regex },
}

impl DocumentFilter {
    /// Compiles `filter`; `None` matches every document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidQuery`] for a pattern that is not
    /// a string or does not parse.
    pub fn compile(filter: Option<&Expr>) -> DocumentStoreResult<Self> {
        match filter {
            Some(expr) => FilterCompiler.visit_expr(expr),
            None => Ok(DocumentFilter::All),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            DocumentFilter::All => true,
            DocumentFilter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
            DocumentFilter::Eq { field, value } => equals_any(&path_values(document, field), value),
            DocumentFilter::Matches { field, regex } => path_values(document, field)
                .iter()
                .any(|candidate| candidate.as_str().is_some_and(|s| regex.is_match(s))),
        }
    }

    pub fn filter_documents<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> Vec<Document> {
        documents
            .into_iter()
            .filter(|document| self.matches(document))
            .cloned()
            .collect()
    }
}

fn equals_any(candidates: &[&Bson], value: &Bson) -> bool {
    // `null` also matches a missing field.
    if candidates.is_empty() {
        return matches!(value, Bson::Null);
    }

    let value = Comparable::from(value);
    candidates.iter().any(|candidate| Comparable::from(*candidate) == value)
}

fn pattern(value: &Bson) -> DocumentStoreResult<Regex> {
    let source = value
        .as_str()
        .ok_or_else(|| DocumentStoreError::InvalidQuery(format!("pattern must be a string, got {value}")))?;

    Regex::new(source).map_err(|e| DocumentStoreError::InvalidQuery(e.to_string()))
}

struct FilterCompiler;

impl QueryVisitor for FilterCompiler {
    type Output = DocumentFilter;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        exprs
            .iter()
            .map(|expr| self.visit_expr(expr))
            .collect::<Result<Vec<_>, _>>()
            .map(DocumentFilter::And)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let field = field.to_string();

        match op {
            FieldOp::Eq => Ok(DocumentFilter::Eq { field, value: value.clone() }),
            FieldOp::Matches => Ok(DocumentFilter::Matches { field, regex: pattern(value)? }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmodel_core::query::Filter;

    fn restaurant() -> Document {
        doc! {
            "name": "Vella",
            "borough": "Manhattan",
            "address": { "zipcode": "10075", "coord": [-73.9557413, 40.7720266] },
            "grades": [
                { "grade": "A", "score": 11 },
                { "grade": "B", "score": 17 },
            ],
        }
    }

    fn eval(expr: Expr) -> bool {
        DocumentFilter::compile(Some(&expr)).unwrap().matches(&restaurant())
    }

    #[test]
    fn resolves_nested_and_array_element_paths() {
        assert!(eval(Filter::eq("address.zipcode", "10075")));
        assert!(eval(Filter::eq("grades.grade", "B")));
        assert!(!eval(Filter::eq("grades.grade", "C")));
        assert!(eval(Filter::eq("address.coord", 40.7720266)));
        assert!(eval(Filter::eq("grades.score", 17.0)));
    }

    #[test]
    fn null_matches_missing_fields() {
        assert!(eval(Filter::eq("cuisine", Bson::Null)));
        assert!(!eval(Filter::eq("borough", Bson::Null)));
    }

    #[test]
    fn conjunctions_need_every_clause() {
        assert!(eval(Filter::eq("borough", "Manhattan").and(Filter::eq("grades.grade", "A"))));
        assert!(!eval(Filter::eq("borough", "Manhattan").and(Filter::eq("grades.grade", "C"))));
        assert!(DocumentFilter::compile(None).unwrap().matches(&restaurant()));
    }

    #[test]
    fn patterns_are_case_sensitive() {
        assert!(eval(Filter::matches("name", "^Vel")));
        assert!(!eval(Filter::matches("name", "^vel")));
        assert!(!eval(Filter::matches("grades.score", "1")));
    }

    #[test]
    fn invalid_pattern_fails_at_compile_time() {
        let result = DocumentFilter::compile(Some(&Filter::matches("name", "(")));

        assert!(matches!(result, Err(DocumentStoreError::InvalidQuery(_))));

        let result = DocumentFilter::compile(Some(&Expr::field("name".to_string(), FieldOp::Matches, Bson::Int32(1))));

        assert!(matches!(result, Err(DocumentStoreError::InvalidQuery(_))));
    }

    #[test]
    fn compiled_filter_is_reused_across_documents() {
        let filter = DocumentFilter::compile(Some(&Filter::matches("name", "^Fluff"))).unwrap();
        let kittens = [doc! { "name": "fluffy" }, doc! { "name": "Fluffball" }, doc! { "age": 3 }];

        let matched = filter.filter_documents(kittens.iter());

        assert_eq!(matched, [doc! { "name": "Fluffball" }]);
    }
}
