//! The document store seam.

use async_trait::async_trait;

use crate::collection::Collection;
use crate::error::DbResult;
use crate::id::DocumentId;

/// Minimal set of operations the storefront tooling needs from a document
/// store.
///
/// Documents cross this boundary as JSON values so the trait stays object
/// safe; typed helpers live in [`crate::queries`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short description for logs, e.g. the connection URL.
    fn describe(&self) -> String;

    /// Delete every document in a collection.
    async fn clear(&self, collection: Collection) -> DbResult<()>;

    /// Insert one document under the given id.
    async fn insert(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: serde_json::Value,
    ) -> DbResult<()>;

    /// Overwrite the aggregate rating fields of a product.
    async fn set_product_rating(
        &self,
        product: &DocumentId,
        rating: f64,
        review_count: u64,
    ) -> DbResult<()>;

    /// Number of documents in a collection.
    async fn count(&self, collection: Collection) -> DbResult<u64>;
}
