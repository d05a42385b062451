//! The models exercised by the modeled endpoints, plus the raw seed document.

use bson::{Bson, DateTime, Document as BsonDocument, Uuid, doc};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use docmodel::{
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    model::Model,
    schema::{FieldDef, Schema, Validator},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl Document for Person {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "people"
    }
}

impl Model for Person {
    fn model_name() -> &'static str {
        "Person"
    }

    /// Inline nested paths, both required.
    fn schema() -> Schema {
        PersonVariant::INLINE.schema()
    }
}

/// One configuration of the rules on `Person.name`.
///
/// `embedded` declares the name as a sub-document with its own schema, which
/// is only evaluated when present; otherwise `first` and `last` are inline
/// paths that are always evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonVariant {
    pub parent_required: bool,
    pub children_required: bool,
    pub embedded: bool,
}

impl PersonVariant {
    /// Sub-document required, its fields not.
    pub const REQUIRED_NAME: Self = Self { parent_required: true, children_required: false, embedded: true };
    /// Sub-document and its fields required.
    pub const REQUIRED_NAME_AND_PARTS: Self = Self { parent_required: true, children_required: true, embedded: true };
    /// Optional sub-document with required fields.
    pub const OPTIONAL_NAME: Self = Self { parent_required: false, children_required: true, embedded: true };
    pub const INLINE: Self = Self { parent_required: false, children_required: true, embedded: false };

    pub fn schema(&self) -> Schema {
        let name = Schema::new()
            .field(FieldDef::string("first").required_if(self.children_required))
            .field(FieldDef::string("last").required_if(self.children_required));

        let name = if self.embedded {
            FieldDef::embedded("name", name)
        } else {
            FieldDef::object("name", name)
        };

        Schema::new()
            .field(name.required_if(self.parent_required))
            .field(FieldDef::number("age"))
            .field(FieldDef::string("gender"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kitten {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
}

impl Kitten {
    pub fn speak(&self) -> String {
        greeting(self.name.as_deref())
    }
}

/// What a kitten called `name` says about itself.
pub fn greeting(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("Meow name is {name}"),
        _ => "I don't have a name".to_string(),
    }
}

impl Document for Kitten {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "kittens"
    }
}

impl Model for Kitten {
    fn model_name() -> &'static str {
        "Kitten"
    }

    fn schema() -> Schema {
        Schema::new()
            .field(
                FieldDef::string("name")
                    .required_with("All kittens need names!")
                    .validate(Validator::not_blank("`{VALUE}` is not a valid name!")),
            )
            .field(FieldDef::number("age").required_with("Why no age?"))
            .field(FieldDef::reference("owner", Person::collection_name()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puppy {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
}

impl Document for Puppy {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "puppies"
    }
}

impl Model for Puppy {
    fn model_name() -> &'static str {
        "Puppy"
    }

    fn schema() -> Schema {
        Schema::new()
            .field(FieldDef::string("name"))
            .field(FieldDef::number("age"))
    }
}

pub const RESTAURANTS: &str = "restaurants";

fn utc_midnight(year: i32, month: u32, day: u32) -> DocumentStoreResult<Bson> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .map(|date| Bson::DateTime(DateTime::from_chrono(date)))
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("invalid date {year}-{month}-{day}")))
}

/// The fixed restaurant inserted by the raw insert endpoint.
pub fn restaurant_seed() -> DocumentStoreResult<BsonDocument> {
    Ok(doc! {
        "address": {
            "street": "2 Avenue",
            "zipcode": "10075",
            "building": "1480",
            "coord": [-73.9557413, 40.7720266],
        },
        "borough": "Manhattan",
        "cuisine": "Italian",
        "grades": [
            { "date": utc_midnight(2014, 10, 1)?, "grade": "A", "score": 11 },
            { "date": utc_midnight(2014, 1, 16)?, "grade": "B", "score": 17 },
        ],
        "name": "Vella",
        "restaurant_id": "41704620",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmodel::validate::SchemaValidator;

    fn errors(variant: PersonVariant, input: BsonDocument) -> Vec<String> {
        match SchemaValidator::new("Person", &variant.schema()).validate_document(&input) {
            Ok(_) => Vec::new(),
            Err(error) => error.errors.into_keys().collect(),
        }
    }

    #[test]
    fn person_variants_compose_parent_and_child_rules() {
        let keith = doc! { "name": { "first": "Keith" } };

        assert!(errors(PersonVariant::REQUIRED_NAME, keith.clone()).is_empty());
        assert_eq!(errors(PersonVariant::REQUIRED_NAME, doc! {}), ["name"]);
        assert_eq!(errors(PersonVariant::REQUIRED_NAME_AND_PARTS, keith), ["name.last"]);
        assert!(errors(PersonVariant::OPTIONAL_NAME, doc! {}).is_empty());
        assert_eq!(errors(PersonVariant::INLINE, doc! {}), ["name.first", "name.last"]);
    }

    #[test]
    fn kittens_greet_by_name() {
        let kitten = Kitten { id: Uuid::new(), name: Some("fluffy".to_string()), age: None, owner: None };

        assert_eq!(kitten.speak(), "Meow name is fluffy");
        assert_eq!(greeting(None), "I don't have a name");
    }

    #[test]
    fn seed_dates_are_utc_midnight() {
        let seed = restaurant_seed().unwrap();
        let grades = seed.get_array("grades").unwrap();
        let first = grades[0].as_document().unwrap().get_datetime("date").unwrap();

        assert_eq!(first.timestamp_millis(), 1_412_121_600_000);
    }
}
