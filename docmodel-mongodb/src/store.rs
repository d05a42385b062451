use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use bson::{Document, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind},
    options::ClientOptions,
};
use docmodel_core::{
    backend::{DocumentStream, StoreBackend, StoreBackendBuilder},
    document::with_id,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query},
    update::UpdateResult,
};

use crate::query::MongoQueryTranslator;


/// Separates "the server cannot be reached" from every other driver error.
fn map_error(error: MongoError) -> DocumentStoreError {
    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => DocumentStoreError::Connection(error.to_string()),
        _ => DocumentStoreError::Backend(error.to_string()),
    }
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_error)?;

        Ok(())
    }

    async fn insert_documents(&self, documents: Vec<(Uuid, Document)>, collection: &str) -> DocumentStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        self.get_collection(collection)
            .insert_many(documents.into_iter().map(|(id, doc)| with_id(id, doc)))
            .await
            .map_err(map_error)?;

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(map_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(map_error)
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.stream_documents(query, collection)
            .await?
            .try_collect::<Vec<Document>>()
            .await
    }

    async fn stream_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<DocumentStream> {
        let cursor = self.get_collection(collection)
            .find(MongoQueryTranslator::filter(query.filter.as_ref())?)
            .await
            .map_err(map_error)?;

        Ok(cursor.map_err(map_error).boxed())
    }

    async fn update_documents(
        &self,
        filter: Option<Expr>,
        fields: Document,
        multi: bool,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = MongoQueryTranslator::filter(filter.as_ref())?;
        let update = doc! { "$set": fields };
        let collection = self.get_collection(collection);

        let result = if multi {
            collection.update_many(filter, update).await
        } else {
            collection.update_one(filter, update).await
        }
        .map_err(map_error)?;

        Ok(UpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Opens [`MongoDbStore`] connections from a connection string.
///
/// Cloning the builder is cheap; each build opens an independent client.
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    timeout: Option<Duration>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            timeout: None,
        }
    }

    /// Bounds connection establishment and server selection.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        if let Some(timeout) = self.timeout {
            options.connect_timeout = Some(timeout);
            options.server_selection_timeout = Some(timeout);
        }

        tracing::debug!(database = %self.database, "opening mongodb client");

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_timeout() {
        let builder = MongoDbStore::builder("mongodb://localhost:27017", "test")
            .timeout(Duration::from_secs(5));

        assert_eq!(builder.timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.database(), "test");
    }
}
