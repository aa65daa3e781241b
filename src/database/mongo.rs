//! MongoDB connection for the shared remote tier.

use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::Document;
use mongodb::{options::ClientOptions, Client, Collection};
use tracing::info;

use crate::cache::{Clock, Payload};
use super::repository::MongoStore;

/// Database wrapper for the network-shared cache tables.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// `timeout` bounds server selection and connection so an unreachable
    /// cluster fails fast instead of stalling startup.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the ping fails.
    pub async fn connect(uri: &str, db_name: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("food-buddy".to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        let db = client.database(db_name);

        Ok(Self { db })
    }

    /// Untyped collection; stores encode their own payloads.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    /// A typed store over one shared collection.
    pub fn store<V: Payload>(
        &self,
        collection: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> MongoStore<V> {
        MongoStore::new(self.collection(collection), timeout, clock)
    }
}
