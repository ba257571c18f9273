//! Full-replace collection writer.

use serde::Serialize;
use storefront_db::queries::insert_document;
use storefront_db::{DbError, DbResult, DocumentId, DocumentStore};
use tracing::{debug, warn};

use crate::entity::EntityKind;
use crate::identity::IdentityMap;
use crate::transform::Transformed;

/// An insert that failed. The record is left out of the target.
#[derive(Debug)]
pub struct WriteFailure {
    pub legacy_id: i64,
    pub error: DbError,
}

/// Result of writing one pass's documents.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// New id per input document, in input order; `None` where the insert
    /// failed.
    pub ids: Vec<Option<DocumentId>>,
    pub failures: Vec<WriteFailure>,
}

impl WriteOutcome {
    pub fn written(&self) -> usize {
        self.ids.iter().filter(|id| id.is_some()).count()
    }
}

/// Writes documents into the store one at a time.
pub struct Writer<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Writer<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Clear the kind's collection, then insert every document under a
    /// freshly generated id.
    ///
    /// Each successful insert is registered in `ids` before the next one
    /// starts. Only a failed clear is returned as an error; insert failures
    /// are collected in the outcome.
    pub async fn write_all<T: Serialize>(
        &self,
        kind: EntityKind,
        docs: &[Transformed<T>],
        ids: &mut IdentityMap,
    ) -> DbResult<WriteOutcome> {
        let collection = kind.collection();
        self.store.clear(collection).await?;
        debug!("Cleared {} collection", collection);

        let mut outcome = WriteOutcome {
            ids: Vec::with_capacity(docs.len()),
            failures: Vec::new(),
        };

        for doc in docs {
            let id = DocumentId::generate();
            match insert_document(self.store, collection, &id, &doc.document).await {
                Ok(()) => {
                    ids.register(kind, doc.legacy_id, id.clone());
                    outcome.ids.push(Some(id));
                }
                Err(error) => {
                    warn!(
                        entity = %kind,
                        legacy_id = doc.legacy_id,
                        error = %error,
                        "Insert failed, skipping record"
                    );
                    outcome.ids.push(None);
                    outcome.failures.push(WriteFailure {
                        legacy_id: doc.legacy_id,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }
}
