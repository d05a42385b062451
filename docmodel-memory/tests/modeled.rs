use bson::{Bson, Document as BsonDocument, Uuid, doc};
use serde::{Deserialize, Serialize};

use docmodel_core::{
    document::{Document, uuid_from_bson},
    error::{DocumentStoreError, FieldErrorKind},
    model::Model,
    populate::Expansion,
    query::{Filter, Query},
    raw::RawAccess,
    schema::{FieldDef, Schema, Validator},
    store::DocumentStore,
    update::{UpdateOptions, UpdateResult},
};
use docmodel_memory::InMemoryStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Person {
    #[serde(rename = "_id")]
    id: Uuid,
    name: BsonDocument,
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

    fn schema() -> Schema {
        Schema::new()
            .field(FieldDef::object(
                "name",
                Schema::new()
                    .field(FieldDef::string("first").required())
                    .field(FieldDef::string("last").required()),
            ))
            .field(FieldDef::number("age"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Kitten {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    age: f64,
    owner: Option<Uuid>,
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
            .field(FieldDef::reference("owner", "people"))
    }
}

fn validation_paths(error: DocumentStoreError) -> Vec<String> {
    match error {
        DocumentStoreError::Validation(error) => error.errors.into_keys().collect(),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_person_reports_both_name_parts() {
    let store = DocumentStore::new(InMemoryStore::new());

    let error = store.model::<Person>().save(doc! {}).await.unwrap_err();

    assert_eq!(validation_paths(error), ["name.first", "name.last"]);
    assert!(store.collection("people").find(Query::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn save_coerces_and_drops_undeclared_fields() {
    let store = DocumentStore::new(InMemoryStore::new());
    let kittens = store.model::<Kitten>();

    let saved = kittens
        .save(doc! { "name": "yoda", "age": "12", "color": "white" })
        .await
        .unwrap();

    assert_eq!(saved.get("age"), Some(&Bson::Int32(12)));
    assert!(!saved.contains_key("color"));

    let stored = kittens.find(Query::all()).await.unwrap();
    assert_eq!(stored, vec![saved.clone()]);

    let id = saved.get("_id").and_then(uuid_from_bson).unwrap();
    let typed = kittens.get(vec![id]).await.unwrap();
    assert_eq!(typed[0].age, 12.0);
}

#[tokio::test]
async fn save_reports_cast_and_required_together() {
    let store = DocumentStore::new(InMemoryStore::new());

    let error = store
        .model::<Kitten>()
        .save(doc! { "name": "   ", "age": "a" })
        .await
        .unwrap_err();

    match error {
        DocumentStoreError::Validation(error) => {
            assert_eq!(error.len(), 2);
            assert_eq!(error.get("name").unwrap().kind, FieldErrorKind::Required);
            assert_eq!(error.get("name").unwrap().message, "All kittens need names!");
            assert_eq!(error.get("age").unwrap().kind, FieldErrorKind::Cast);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn save_rejects_malformed_identity() {
    let store = DocumentStore::new(InMemoryStore::new());

    let error = store
        .model::<Kitten>()
        .save(doc! { "_id": 7, "name": "fluffy", "age": 2 })
        .await
        .unwrap_err();

    assert_eq!(validation_paths(error), ["_id"]);
}

#[tokio::test]
async fn default_update_changes_one_document_and_keeps_undeclared_fields() {
    let store = DocumentStore::new(InMemoryStore::new());
    let kittens = store.model::<Kitten>();

    for name in ["fluffy", "Fluffball", "Yoda"] {
        kittens.save(doc! { "name": name, "age": 2 }).await.unwrap();
    }

    let result = kittens
        .update(None, doc! { "color": "white", "name": "YODA" }, UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

    let stored = kittens.find(Query::all()).await.unwrap();
    assert_eq!(stored[0].get_str("color").unwrap(), "white");
    assert_eq!(stored[0].get_str("name").unwrap(), "YODA");
    assert_eq!(stored[1].get_str("name").unwrap(), "Fluffball");
    assert!(!stored[1].contains_key("color"));
}

#[tokio::test]
async fn validated_update_filters_and_checks_fields() {
    let store = DocumentStore::new(InMemoryStore::new());
    let kittens = store.model::<Kitten>();
    kittens.save(doc! { "name": "fluffy", "age": 2 }).await.unwrap();

    let result = kittens
        .update(None, doc! { "color": "white" }, UpdateOptions::validated())
        .await
        .unwrap();
    assert_eq!(result, UpdateResult::default());

    let result = kittens
        .update(None, doc! { "age": "3", "name": "Mr. Floof" }, UpdateOptions::validated())
        .await
        .unwrap();
    assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

    let error = kittens
        .update(None, doc! { "name": "" }, UpdateOptions::validated())
        .await
        .unwrap_err();
    assert_eq!(validation_paths(error), ["name"]);

    let stored = kittens.find(Query::all()).await.unwrap();
    assert_eq!(stored[0].get_str("name").unwrap(), "Mr. Floof");
    assert_eq!(stored[0].get("age"), Some(&Bson::Int32(3)));
    assert!(!stored[0].contains_key("color"));
}

#[tokio::test]
async fn expansion_resolves_references_on_request() {
    let store = DocumentStore::new(InMemoryStore::new());

    let keith = store
        .model::<Person>()
        .save(doc! { "name": { "first": "Keith", "last": "Person" } })
        .await
        .unwrap();
    let keith_id = keith.get("_id").cloned().unwrap();

    let kittens = store.model::<Kitten>();
    kittens
        .save(doc! { "name": "Yoda", "age": 900, "owner": keith_id.clone() })
        .await
        .unwrap();
    kittens
        .save(doc! { "name": "Stray", "age": 1, "owner": Uuid::new() })
        .await
        .unwrap();

    let yoda = Query::filtered(Filter::eq("name", "Yoda"));

    let plain = kittens.find_expanded(yoda.clone(), &Expansion::parse("")).await.unwrap();
    assert_eq!(plain[0].get("owner"), Some(&keith_id));

    let expanded = kittens.find_expanded(yoda, &Expansion::parse("owner")).await.unwrap();
    assert_eq!(expanded[0].get("owner"), Some(&Bson::Document(keith)));

    let dangling = kittens
        .find_expanded(Query::filtered(Filter::eq("name", "Stray")), &Expansion::parse("owner age"))
        .await
        .unwrap();
    assert_eq!(dangling[0].get("owner"), Some(&Bson::Null));
}

#[tokio::test]
async fn raw_cursor_closes_after_exhaustion() {
    let shared = InMemoryStore::new();
    let raw = RawAccess::new(shared.connector());

    raw.test_connection().await.unwrap();
    raw.insert_one("restaurants", doc! { "borough": "Manhattan", "address": { "zipcode": "10075" } })
        .await
        .unwrap();
    raw.insert_one("restaurants", doc! { "borough": "Queens", "address": { "zipcode": "11101" } })
        .await
        .unwrap();

    let mut cursor = raw
        .find_by_nested_field("restaurants", "address.zipcode", "10075")
        .await
        .unwrap();

    let first = cursor.try_next().await.unwrap().unwrap();
    assert_eq!(first.get_str("borough").unwrap(), "Manhattan");
    assert!(cursor.try_next().await.unwrap().is_none());
    assert!(cursor.is_closed());
    assert!(cursor.try_next().await.unwrap().is_none());

    let mut all = raw.find_all("restaurants").await.unwrap();
    let mut count = 0;
    while all.try_next().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

async fn restaurant_names(mut cursor: docmodel_core::raw::RawCursor<InMemoryStore>) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(document) = cursor.try_next().await.unwrap() {
        names.push(document.get_str("name").unwrap().to_string());
    }
    assert!(cursor.is_closed());
    names
}

async fn seeded_restaurants() -> RawAccess<docmodel_memory::InMemoryStoreBuilder> {
    let raw = RawAccess::new(InMemoryStore::new().connector());

    for restaurant in [
        doc! {
            "name": "Vella",
            "borough": "Manhattan",
            "grades": [{ "grade": "A", "score": 11 }, { "grade": "B", "score": 17 }],
        },
        doc! {
            "name": "Wendy'S",
            "borough": "Brooklyn",
            "grades": [{ "grade": "B", "score": 9 }],
        },
        doc! {
            "name": "Riviera Caterer",
            "borough": "Manhattan",
            "grades": [{ "grade": "A", "score": 5 }],
        },
        doc! { "name": "Tov Kosher Kitchen", "borough": "Queens", "grades": "B" },
    ] {
        raw.insert_one("restaurants", restaurant).await.unwrap();
    }

    raw
}

#[tokio::test]
async fn raw_find_by_top_level_field() {
    let raw = seeded_restaurants().await;

    let cursor = raw.find_by_field("restaurants", "borough", "Manhattan").await.unwrap();

    assert_eq!(restaurant_names(cursor).await, ["Vella", "Riviera Caterer"]);
}

#[tokio::test]
async fn raw_find_by_array_element_field() {
    let raw = seeded_restaurants().await;

    let cursor = raw
        .find_by_array_element_field("restaurants", "grades.grade", "B")
        .await
        .unwrap();

    // A scalar `grades` has no `grade` element to match.
    assert_eq!(restaurant_names(cursor).await, ["Vella", "Wendy'S"]);
}
