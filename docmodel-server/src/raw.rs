//! Raw access endpoints.
//!
//! Each request opens its own connection, runs one operation against the
//! `restaurants` collection and closes the connection again. Found documents
//! are logged rather than returned.

use axum::{Router, extract::State, routing::get};

use docmodel::raw::RawCursor;
use docmodel::backend::StoreBackend;

use crate::{
    app::{AppState, Connector},
    error::ApiResult,
    models::{RESTAURANTS, restaurant_seed},
};

pub fn raw_routes<C: Connector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/test-connection", get(test_connection::<C>))
        .route("/insert", get(insert::<C>))
        .route("/find-all", get(find_all::<C>))
        .route("/find-filtered", get(find_filtered::<C>))
        .route("/find-nested", get(find_nested::<C>))
        .route("/find-array", get(find_array::<C>))
        .with_state(state)
}

async fn test_connection<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    state.raw.test_connection().await?;
    tracing::info!(target: "docmodel::raw", "Connected correctly to server.");

    Ok("Done")
}

async fn insert<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    let id = state.raw.insert_one(RESTAURANTS, restaurant_seed()?).await?;
    tracing::info!(target: "docmodel::raw", %id, "Inserted a document into the restaurants collection.");

    Ok("Done")
}

/// Logs every document of `cursor` until it is exhausted.
async fn drain<B: StoreBackend>(mut cursor: RawCursor<B>) -> ApiResult<&'static str> {
    let mut count = 0usize;

    while let Some(document) = cursor.try_next().await? {
        tracing::info!(target: "docmodel::raw", %document, "found");
        count += 1;
    }

    tracing::debug!(target: "docmodel::raw", count, "cursor exhausted");

    Ok("Done")
}

async fn find_all<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    drain(state.raw.find_all(RESTAURANTS).await?).await
}

async fn find_filtered<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    drain(state.raw.find_by_field(RESTAURANTS, "borough", "Manhattan").await?).await
}

async fn find_nested<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    drain(state.raw.find_by_nested_field(RESTAURANTS, "address.zipcode", "10075").await?).await
}

async fn find_array<C: Connector>(State(state): State<AppState<C>>) -> ApiResult<&'static str> {
    drain(state.raw.find_by_array_element_field(RESTAURANTS, "grades.grade", "B").await?).await
}
