//! # HTTP Server
//!
//! Shared state, the combined router and the serve loop.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use docmodel::{backend::StoreBackendBuilder, raw::RawAccess, store::DocumentStore};

use crate::{modeled::modeled_routes, raw::raw_routes};

/// A cloneable backend factory usable from request handlers.
pub trait Connector: StoreBackendBuilder + Clone + Send + Sync + 'static {}

impl<T> Connector for T where T: StoreBackendBuilder + Clone + Send + Sync + 'static {}

/// State shared across handlers.
///
/// The modeled layer keeps one long-lived backend; the raw layer keeps only
/// the connector and opens a backend per request.
pub struct AppState<C: Connector> {
    pub store: Arc<DocumentStore<C::Backend>>,
    pub raw: RawAccess<C>,
}

impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            raw: self.raw.clone(),
        }
    }
}

impl<C: Connector> AppState<C> {
    /// Opens the long-lived backend and keeps `connector` for raw access.
    pub async fn connect(connector: C) -> docmodel::error::DocumentStoreResult<Self> {
        let backend = connector.clone().build().await?;

        Ok(Self {
            store: Arc::new(DocumentStore::new(backend)),
            raw: RawAccess::new(connector),
        })
    }
}

async fn hello() -> &'static str {
    "Hello World!"
}

/// Build the combined router with all endpoints
pub fn router<C: Connector>(state: AppState<C>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(hello))
        .nest("/raw", raw_routes(state.clone()))
        .nest("/modeled", modeled_routes(state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Serves `router` on `addr` until the process is stopped.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(target: "docmodel::server", %addr, "listening");

    axum::serve(listener, router).await
}
