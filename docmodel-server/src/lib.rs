//! HTTP endpoints exercising raw and schema-checked document access.
//!
//! - `/raw/*` - one connection per request, schema-less `restaurants` documents
//! - `/modeled/*` - a long-lived store with `Person`, `Kitten` and `Puppy` models
//!
//! [`run`] picks the backend from [`ServerConfig`], verifies the store is
//! reachable and serves until the process is stopped.

pub mod app;
pub mod config;
pub mod error;
pub mod modeled;
pub mod models;
pub mod raw;
pub mod render;

use docmodel::memory::InMemoryStore;

use crate::app::{AppState, Connector};

pub use crate::config::{BackendKind, ServerConfig};

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Store(#[from] docmodel::error::DocumentStoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("backend `{0:?}` is not compiled in; rebuild with the `mongodb` feature")]
    Unsupported(BackendKind),
}

async fn serve_with<C: Connector>(config: &ServerConfig, connector: C) -> Result<(), ServeError> {
    let state = AppState::connect(connector).await?;

    match state.store.ping().await {
        Ok(()) => tracing::info!(target: "docmodel::server", backend = ?config.backend, "Connected to store"),
        // The raw endpoints still report connection errors per request.
        Err(error) => tracing::warn!(target: "docmodel::server", %error, "store is not reachable yet"),
    }

    let router = app::router(state, config.request_timeout());
    app::serve(config.socket_addr(), router).await?;

    Ok(())
}

/// Runs the server described by `config`.
pub async fn run(config: ServerConfig) -> Result<(), ServeError> {
    match config.backend {
        BackendKind::Memory => serve_with(&config, InMemoryStore::new().connector()).await,
        #[cfg(feature = "mongodb")]
        BackendKind::Mongodb => {
            let connector = docmodel::mongodb::MongoDbStore::builder(&config.mongo_uri, &config.database)
                .timeout(config.request_timeout());
            serve_with(&config, connector).await
        }
        #[cfg(not(feature = "mongodb"))]
        BackendKind::Mongodb => Err(ServeError::Unsupported(config.backend)),
    }
}
