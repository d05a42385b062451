//! BSON to JSON conversion for response bodies.
//!
//! UUIDs render as their hyphenated string and dates as RFC 3339 strings.
//! Anything without a natural JSON form falls back to relaxed extended JSON.

use bson::{Bson, Document, spec::BinarySubtype};
use serde_json::{Map, Value};

use docmodel::document::uuid_from_bson;

pub fn document(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson(value)))
            .collect::<Map<_, _>>(),
    )
}

pub fn documents(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(document).collect())
}

pub fn bson(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Double(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson).collect()),
        Bson::Document(doc) => document(doc),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map_or_else(|_| Value::from(dt.timestamp_millis()), Value::String),
        Bson::Binary(ref binary) if binary.subtype == BinarySubtype::Uuid => uuid_from_bson(&value)
            .map_or_else(|| value.clone().into_relaxed_extjson(), |id| Value::String(id.to_string())),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{DateTime, Uuid, doc};
    use serde_json::json;

    #[test]
    fn renders_ids_and_dates_as_strings() {
        let id = Uuid::new();
        let rendered = document(doc! {
            "_id": id,
            "date": DateTime::from_millis(1_412_121_600_000),
            "coord": [-73.9557413, 40.7720266],
            "score": 11,
        });

        assert_eq!(rendered["_id"], json!(id.to_string()));
        assert_eq!(rendered["date"], json!("2014-10-01T00:00:00Z"));
        assert_eq!(rendered["coord"], json!([-73.9557413, 40.7720266]));
        assert_eq!(rendered["score"], json!(11));
    }
}
