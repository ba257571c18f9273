//! Legacy record to document transformation.
//!
//! One pure function per entity kind. Each takes the legacy row (plus its
//! child rows where the document nests them) and the identity map, and
//! either produces a document with the diagnostics raised while building it
//! or a [`SkipReason`]. Nothing here touches a store.

mod cart;
mod embedded;
mod order;
mod product;
mod review;
mod user;
mod wishlist;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_db::DocumentId;
use thiserror::Error;

pub use cart::transform_cart;
pub use embedded::Embedded;
pub use order::transform_order;
pub use product::transform_product;
pub use review::transform_review;
pub use user::transform_user;
pub use wishlist::transform_wishlist;

use crate::entity::EntityKind;
use crate::identity::IdentityMap;
use crate::record::LegacyRecord;

/// Outcome of transforming one record.
pub type TransformResult<T> = Result<Transformed<T>, SkipReason>;

/// A document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    /// Legacy id the document's new id is registered under
    pub legacy_id: i64,
    pub document: T,
    /// Non-fatal problems: defaulted fields, dropped child lines
    pub issues: Vec<FieldIssue>,
}

impl<T> Transformed<T> {
    pub fn new(legacy_id: i64, document: T) -> Self {
        Self {
            legacy_id,
            document,
            issues: Vec::new(),
        }
    }

    pub fn with_issues(mut self, issues: Vec<FieldIssue>) -> Self {
        self.issues = issues;
        self
    }
}

/// A field that could not be taken from the source as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
    pub resolution: String,
}

impl FieldIssue {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            resolution: resolution.into(),
        }
    }
}

/// Why a record produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid value {value:?} for `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("`{field}` references {kind} {legacy_id}, which was not migrated")]
    UnmappedReference {
        field: &'static str,
        kind: EntityKind,
        legacy_id: i64,
    },
}

/// Shared inputs for every transformer.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub ids: &'a IdentityMap,
    /// Stand-in for absent or unparseable timestamps
    pub now: DateTime<Utc>,
}

impl<'a> TransformContext<'a> {
    pub fn new(ids: &'a IdentityMap, now: DateTime<Utc>) -> Self {
        Self { ids, now }
    }

    /// Resolve a foreign key column to the referenced document's id.
    pub fn resolve(
        &self,
        record: &LegacyRecord,
        field: &'static str,
        kind: EntityKind,
    ) -> Result<DocumentId, SkipReason> {
        let legacy_id = record
            .int(field)
            .ok_or(SkipReason::MissingField { field })?;
        self.ids
            .lookup(kind, legacy_id)
            .cloned()
            .ok_or(SkipReason::UnmappedReference {
                field,
                kind,
                legacy_id,
            })
    }

    /// Timestamp column, falling back to the run time.
    pub fn timestamp(&self, record: &LegacyRecord, field: &str) -> DateTime<Utc> {
        record.timestamp(field).unwrap_or(self.now)
    }
}

/// The record's own legacy id, required for every document.
pub fn require_id(record: &LegacyRecord) -> Result<i64, SkipReason> {
    match record.get("id") {
        None => Err(SkipReason::MissingField { field: "id" }),
        Some(value) => record.legacy_id().ok_or_else(|| SkipReason::InvalidField {
            field: "id",
            value: value.to_string(),
        }),
    }
}

/// Quantity column of a cart or order line. Absent means one.
fn quantity(record: &LegacyRecord, field: &str, issues: &mut Vec<FieldIssue>) -> u32 {
    match record.get("quantity") {
        None => 1,
        Some(raw) => match record
            .int("quantity")
            .and_then(|q| u32::try_from(q).ok())
            .filter(|q| *q > 0)
        {
            Some(q) => q,
            None => {
                issues.push(FieldIssue::new(
                    field,
                    format!("invalid quantity {raw}"),
                    "set to 1",
                ));
                1
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> LegacyRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve() {
        let mut ids = IdentityMap::new();
        let user = DocumentId::generate();
        ids.register(EntityKind::User, 1, user.clone());
        let ctx = TransformContext::new(&ids, Utc::now());

        let r = record(json!({ "user_id": "1", "other_id": 2 }));
        assert_eq!(ctx.resolve(&r, "user_id", EntityKind::User), Ok(user));
        assert_eq!(
            ctx.resolve(&r, "other_id", EntityKind::User),
            Err(SkipReason::UnmappedReference {
                field: "other_id",
                kind: EntityKind::User,
                legacy_id: 2,
            })
        );
        assert_eq!(
            ctx.resolve(&r, "product_id", EntityKind::Product),
            Err(SkipReason::MissingField { field: "product_id" })
        );
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(&record(json!({ "id": 5 }))), Ok(5));
        assert_eq!(
            require_id(&record(json!({ "id": null }))),
            Err(SkipReason::MissingField { field: "id" })
        );
        assert!(matches!(
            require_id(&record(json!({ "id": "abc" }))),
            Err(SkipReason::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn test_quantity() {
        let mut issues = Vec::new();
        assert_eq!(quantity(&record(json!({})), "items[0]", &mut issues), 1);
        assert_eq!(quantity(&record(json!({ "quantity": "3" })), "items[0]", &mut issues), 3);
        assert!(issues.is_empty());

        assert_eq!(quantity(&record(json!({ "quantity": -2 })), "items[1]", &mut issues), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "items[1]");
    }
}
