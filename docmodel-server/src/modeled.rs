//! Schema-checked endpoints.
//!
//! Each endpoint runs one fixed operation against the long-lived store and
//! returns the stored result, or the error reported by the access layer.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    routing::get,
};
use bson::{Bson, Document as BsonDocument, Uuid, doc, ser::serialize_to_bson};
use futures::TryStreamExt;
use serde_json::Value;

use docmodel::{
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    populate::Expansion,
    query::{Filter, Query},
    update::{UpdateOptions, UpdateResult},
};

use crate::{
    app::{AppState, Connector},
    error::{ApiError, ApiResult},
    models::{Kitten, Person, PersonVariant, Puppy, greeting},
    render,
};

const UPDATE_DONE: &str = "success - check documents";

pub fn modeled_routes<C: Connector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/kittens", get(list_kittens::<C>).post(create_kitten::<C>))
        .route("/kittens2", get(stream_kittens::<C>))
        .route("/kittens/Fluff", get(fluff_kittens::<C>))
        .route("/pair", get(pair::<C>))
        .route("/update-all", get(update_all::<C>))
        .route("/update-bad-field", get(update_bad_field::<C>))
        .route("/update-mix", get(update_mix::<C>))
        .route("/expand-yoda", get(expand_yoda::<C>))
        .route("/dont-expand-yoda", get(dont_expand_yoda::<C>))
        .route("/save-undefined-fields", get(save_undefined_fields::<C>))
        .route("/save-wrong-type", get(save_wrong_type::<C>))
        .route("/save-string-for-number", get(save_string_for_number::<C>))
        .route("/save-string-for-number2", get(save_string_for_number2::<C>))
        .route("/save-without-name", get(save_without_name::<C>))
        .route("/save-without-name-or-age", get(save_without_name_or_age::<C>))
        .route("/save-empty-name", get(save_empty_name::<C>))
        .route("/save-null-name", get(save_null_name::<C>))
        .route("/save-spaces-for-name", get(save_spaces_for_name::<C>))
        .route("/no-last-name", get(no_last_name::<C>))
        .route("/no-name", get(no_name::<C>))
        .route("/no-last-name2", get(no_last_name2::<C>))
        .route("/no-name2", get(no_name2::<C>))
        .route("/no-name3", get(no_name3::<C>))
        .route("/update-val-bad-fields", get(update_val_bad_fields::<C>))
        .route("/update-val-valid", get(update_val_valid::<C>))
        .route("/update-val-invalid", get(update_val_invalid::<C>))
        .with_state(state)
}

// Saving

/// Reads the optional JSON object layered over the default kitten.
///
/// An empty body means no overrides. Anything else must be a JSON object
/// sent as `application/json`.
fn kitten_overrides(headers: &HeaderMap, body: &Bytes) -> ApiResult<Option<BsonDocument>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !is_json {
        return Err(ApiError::InvalidBody("expected `Content-Type: application/json`".to_string()));
    }

    let Json(body) = Json::<Value>::from_bytes(body).map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

    match serialize_to_bson(&body).map_err(DocumentStoreError::from)? {
        Bson::Document(fields) => Ok(Some(fields)),
        other => Err(ApiError::InvalidBody(format!("expected a JSON object, got {other}"))),
    }
}

/// Saves `{ name: "fluffy" }`, with any fields of a JSON object body layered on top.
async fn create_kitten<C: Connector>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<&'static str> {
    let mut input = doc! { "name": "fluffy" };

    for (key, value) in kitten_overrides(&headers, &body)?.unwrap_or_default() {
        input.insert(key, value);
    }

    tracing::info!(target: "docmodel::modeled", "{}", greeting(input.get_str("name").ok()));

    let saved = Kitten::from_document(state.store.model::<Kitten>().save(input).await?)?;
    tracing::info!(target: "docmodel::modeled", id = %saved.id(), "{}", saved.speak());

    Ok("Success!")
}

// Finding

async fn list_kittens<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    let kittens = state.store.model::<Kitten>().find(Query::all()).await?;

    Ok(Json(render::documents(kittens)))
}

/// Same result as [`list_kittens`], read through a stream.
async fn stream_kittens<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    let kittens = state
        .store
        .collection(Kitten::collection_name())
        .stream(Query::all())
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(render::documents(kittens)))
}

async fn fluff_kittens<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    let kittens = state
        .store
        .model::<Kitten>()
        .find(Query::filtered(Filter::matches("name", "^Fluff")))
        .await?;

    Ok(Json(render::documents(kittens)))
}

/// Saves Keith, then a kitten Yoda owned by Keith.
async fn pair<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    let id = Uuid::new();

    state
        .store
        .model::<Person>()
        .save(doc! { "_id": id, "name": { "first": "Keith", "last": "Person" }, "age": 23 })
        .await?;
    state
        .store
        .model::<Kitten>()
        .save(doc! { "name": "Yoda", "age": 900, "owner": id })
        .await?;

    Ok("Saved keith and yoda")
}

// Updating

async fn update_kittens<C: Connector>(
    state: &AppState<C>,
    fields: BsonDocument,
    options: UpdateOptions,
) -> DocumentStoreResult<UpdateResult> {
    let result = state.store.model::<Kitten>().update(None, fields, options).await?;
    tracing::info!(
        target: "docmodel::modeled",
        matched = result.matched,
        modified = result.modified,
        validated = options.run_validators,
        "update applied"
    );

    Ok(result)
}

async fn update_all<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "name": "Yodsie" }, UpdateOptions::default()).await?;

    Ok(UPDATE_DONE)
}

async fn update_bad_field<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "color": "white" }, UpdateOptions::default()).await?;

    Ok(UPDATE_DONE)
}

async fn update_mix<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "color": "white", "name": "YODA" }, UpdateOptions::default()).await?;

    Ok(UPDATE_DONE)
}

async fn update_val_bad_fields<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "color": "white" }, UpdateOptions::validated()).await?;

    Ok(UPDATE_DONE)
}

async fn update_val_valid<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "age": 3, "name": "Mr. Floof" }, UpdateOptions::validated()).await?;

    Ok(UPDATE_DONE)
}

async fn update_val_invalid<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    update_kittens(&state, doc! { "name": "" }, UpdateOptions::validated()).await?;

    Ok(UPDATE_DONE)
}

// Optional expansion

async fn find_yoda<C: Connector>(state: &AppState<C>, expansion: &str) -> ApiResult<Json<Value>> {
    let kittens = state
        .store
        .model::<Kitten>()
        .find_expanded(Query::filtered(Filter::eq("name", "Yoda")), &Expansion::parse(expansion))
        .await?;

    Ok(Json(render::documents(kittens)))
}

async fn expand_yoda<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    find_yoda(&state, "owner").await
}

async fn dont_expand_yoda<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    find_yoda(&state, "").await
}

// What can and can't be saved

async fn save_kitten<C: Connector>(state: &AppState<C>, input: BsonDocument) -> ApiResult<Json<Value>> {
    let saved = state.store.model::<Kitten>().save(input).await?;

    Ok(Json(render::document(saved)))
}

async fn save_undefined_fields<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "color": "white", "name": "yoda" }).await
}

async fn save_wrong_type<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "name": "yoda", "age": "12" }).await
}

async fn save_string_for_number<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "name": "yoda", "age": "a" }).await
}

async fn save_string_for_number2<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    let saved = state
        .store
        .model::<Puppy>()
        .save(doc! { "name": "spot", "age": "a" })
        .await?;

    Ok(Json(render::document(saved)))
}

async fn save_without_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "age": 3 }).await
}

async fn save_without_name_or_age<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! {}).await
}

async fn save_empty_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "name": "", "age": 12 }).await
}

async fn save_null_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "name": Bson::Null, "age": 12 }).await
}

async fn save_spaces_for_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_kitten(&state, doc! { "name": "  ", "age": 12 }).await
}

// Validation on nested objects

async fn save_person<C: Connector>(
    state: &AppState<C>,
    variant: PersonVariant,
    input: BsonDocument,
) -> ApiResult<Json<Value>> {
    let saved = state
        .store
        .model::<Person>()
        .with_schema(variant.schema())
        .save(input)
        .await?;

    Ok(Json(render::document(saved)))
}

async fn no_last_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_person(&state, PersonVariant::REQUIRED_NAME, doc! { "name": { "first": "Keith" } }).await
}

async fn no_name<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_person(&state, PersonVariant::REQUIRED_NAME, doc! {}).await
}

async fn no_last_name2<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_person(&state, PersonVariant::REQUIRED_NAME_AND_PARTS, doc! { "name": { "first": "Keith" } }).await
}

async fn no_name2<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_person(&state, PersonVariant::OPTIONAL_NAME, doc! {}).await
}

async fn no_name3<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<Json<Value>> {
    save_person(&state, PersonVariant::INLINE, doc! {}).await
}
