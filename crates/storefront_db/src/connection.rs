//! Document store connection management.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{RecordId, Surreal};
use tracing::{debug, info};

use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::id::DocumentId;
use crate::store::DocumentStore;

/// Connection settings for the SurrealDB document store.
#[derive(Clone, Serialize, Deserialize)]
pub struct SurrealConfig {
    /// Connection string: `ws://`, `wss://`, `http://`, `https://` or `mem://`
    pub url: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Root credentials; sign-in is skipped unless both are set
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SurrealConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
        }
    }
}

// Keep credentials out of logs
impl fmt::Debug for SurrealConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurrealConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_namespace() -> String {
    "storefront".to_string()
}

fn default_database() -> String {
    "storefront".to_string()
}

/// Connection to the storefront's SurrealDB database.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
    url: String,
}

impl SurrealStore {
    /// Connect, sign in if credentials are configured, and select the
    /// namespace and database.
    pub async fn connect(config: &SurrealConfig) -> DbResult<Self> {
        info!("Connecting to document store: {}", config.url);

        let db = any::connect(config.url.as_str())
            .await
            .map_err(|e| DbError::connection(&config.url, e))?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .map_err(|e| DbError::connection(&config.url, e))?;
        }

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| DbError::connection(&config.url, e))?;

        debug!("Document store connection established");

        Ok(Self {
            db,
            url: config.url.clone(),
        })
    }

    /// Check if the store is reachable.
    pub async fn health_check(&self) -> DbResult<()> {
        self.db.health().await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SurrealStore {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn clear(&self, collection: Collection) -> DbResult<()> {
        debug!("Clearing collection {}", collection);
        self.db
            .query("DELETE type::table($table) RETURN NONE")
            .bind(("table", collection.as_str()))
            .await?
            .check()?;
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: serde_json::Value,
    ) -> DbResult<()> {
        self.db
            .query("CREATE type::thing($table, $id) CONTENT $document RETURN NONE")
            .bind(("table", collection.as_str()))
            .bind(("id", id.to_string()))
            .bind(("document", document))
            .await?
            .check()?;
        Ok(())
    }

    async fn set_product_rating(
        &self,
        product: &DocumentId,
        rating: f64,
        review_count: u64,
    ) -> DbResult<()> {
        let mut response = self
            .db
            .query(
                "UPDATE type::thing($table, $id) \
                 MERGE { rating: $rating, review_count: $review_count } RETURN id",
            )
            .bind(("table", Collection::Products.as_str()))
            .bind(("id", product.to_string()))
            .bind(("rating", rating))
            .bind(("review_count", review_count))
            .await?
            .check()?;

        let updated: Vec<RecordId> = response.take((0, "id"))?;
        if updated.is_empty() {
            return Err(DbError::not_found("products", product.as_str()));
        }
        Ok(())
    }

    async fn count(&self, collection: Collection) -> DbResult<u64> {
        let mut response = self
            .db
            .query("SELECT count() AS total FROM type::table($table) GROUP ALL")
            .bind(("table", collection.as_str()))
            .await?
            .check()?;

        let total: Option<i64> = response.take((0, "total"))?;
        Ok(total.unwrap_or(0).max(0) as u64)
    }
}
