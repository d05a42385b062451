//! Query translation from docmodel expressions to MongoDB query syntax.
//!
//! Dot paths are passed through unchanged: MongoDB already resolves them
//! into nested documents and across array elements.

use bson::{Document, Bson, doc};

use docmodel_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::DocumentStoreError,
};


/// Translates query expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Translates an optional filter; `None` becomes the match-all `{}`.
    pub fn filter(expr: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

fn pattern(field: &str, value: &Bson) -> Result<String, DocumentStoreError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DocumentStoreError::InvalidQuery(format!(
            "pattern for `{field}` must be a string, got {value}"
        )))
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Matches => doc! { "$regex": pattern(field, value)? },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel_core::query::Filter;

    #[test]
    fn passes_dot_paths_through() {
        let filter = MongoQueryTranslator::filter(Some(&Filter::eq("grades.grade", "B"))).unwrap();

        assert_eq!(filter, doc! { "grades.grade": { "$eq": "B" } });
    }

    #[test]
    fn missing_filter_matches_everything() {
        assert_eq!(MongoQueryTranslator::filter(None).unwrap(), doc! {});
    }

    #[test]
    fn patterns_pass_through_unchanged() {
        let filter = MongoQueryTranslator::filter(Some(&Filter::matches("name", "^Fluff"))).unwrap();

        assert_eq!(filter, doc! { "name": { "$regex": "^Fluff" } });
    }

    #[test]
    fn conjunctions_use_and() {
        let expr = Filter::eq("borough", "Manhattan").and(Filter::eq("address.zipcode", "10075"));
        let filter = MongoQueryTranslator::filter(Some(&expr)).unwrap();

        assert_eq!(
            filter,
            doc! { "$and": [
                { "borough": { "$eq": "Manhattan" } },
                { "address.zipcode": { "$eq": "10075" } },
            ] }
        );
    }

    #[test]
    fn non_string_pattern_is_rejected() {
        let expr = Expr::field("name".to_string(), FieldOp::Matches, Bson::Int32(1));

        assert!(matches!(
            MongoQueryTranslator::filter(Some(&expr)),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
    }
}
