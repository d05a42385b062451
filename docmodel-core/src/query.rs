//! Query construction and filtering API for document stores.
//!
//! Field names are dot paths: `borough` addresses a top-level field,
//! `address.zipcode` a nested one, and `grades.grade` the `grade` field of
//! every element of the `grades` array. Backends must give these paths the
//! same meaning.
//!
//! ```ignore
//! use docmodel::query::{Query, Filter};
//!
//! let query = Query::filtered(Filter::eq("grades.grade", "B").and(Filter::eq("borough", "Manhattan")));
//! ```

use bson::Bson;

use crate::error::DocumentStoreError;

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    /// Exact match. An array field matches if any element matches.
    Eq,
    /// Regular expression match on string fields.
    Matches,
}

/// A filter expression for querying documents.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// A query over one collection. Without a filter it matches every document,
/// in store order.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Expr>,
}

impl Query {
    /// Creates a query matching every document.
    pub fn all() -> Self {
        Query::default()
    }

    /// Creates a query with the given filter.
    pub fn filtered(filter: Expr) -> Self {
        Query { filter: Some(filter) }
    }
}

/// Helper for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches string fields against a regular expression, e.g. `^Fluff`.
    pub fn matches(field: impl Into<String>, pattern: impl Into<String>) -> Expr {
        Expr::field(field.into(), FieldOp::Matches, Bson::String(pattern.into()))
    }
}

/// Walks a filter expression; implemented by each backend to evaluate or translate it.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_into_one_list() {
        let expr = Filter::eq("borough", "Manhattan")
            .and(Filter::eq("cuisine", "Italian"))
            .and(Filter::matches("name", "^Vel"));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn patterns_are_stored_as_strings() {
        match Filter::matches("name", "^Fluff") {
            Expr::Field { op, value, .. } => {
                assert_eq!(op, FieldOp::Matches);
                assert_eq!(value, Bson::from("^Fluff"));
            }
            other => panic!("expected field expression, got {other:?}"),
        }
    }
}
