//! Typed helpers over [`DocumentStore`].

use serde::Serialize;

use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::id::DocumentId;
use crate::store::DocumentStore;

/// Serialize a document and insert it.
///
/// Only JSON objects are accepted; anything else is rejected before it
/// reaches the store.
pub async fn insert_document<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &DocumentId,
    document: &T,
) -> DbResult<()> {
    let value = serde_json::to_value(document)?;
    if !value.is_object() {
        return Err(DbError::invalid_document(format!(
            "{collection} documents must be JSON objects"
        )));
    }
    store.insert(collection, id, value).await
}

/// Document counts for every collection, in [`Collection::ALL`] order.
pub async fn collection_counts(store: &dyn DocumentStore) -> DbResult<Vec<(Collection, u64)>> {
    let mut counts = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        counts.push((collection, store.count(collection).await?));
    }
    Ok(counts)
}
