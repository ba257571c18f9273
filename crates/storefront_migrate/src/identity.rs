//! Legacy id to document id mapping.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use storefront_db::DocumentId;
use tracing::warn;

use crate::entity::EntityKind;

/// Maps `(entity kind, legacy id)` to the document id assigned in this run.
///
/// Starts empty on every run and only grows. Entries are registered right
/// after the corresponding insert succeeds, so a present entry always
/// points at a document that exists in the target.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    ids: HashMap<(EntityKind, i64), DocumentId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document id for a legacy id, if that record has been written.
    pub fn lookup(&self, kind: EntityKind, legacy_id: i64) -> Option<&DocumentId> {
        self.ids.get(&(kind, legacy_id))
    }

    /// Record the id assigned to a written record.
    ///
    /// A legacy id seen twice keeps its first mapping.
    pub fn register(&mut self, kind: EntityKind, legacy_id: i64, id: DocumentId) {
        match self.ids.entry((kind, legacy_id)) {
            Entry::Occupied(existing) => {
                warn!(
                    entity = %kind,
                    legacy_id,
                    kept = %existing.get(),
                    ignored = %id,
                    "Duplicate legacy id, keeping first mapping"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    /// Number of mapped records of one kind.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.ids.keys().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
