use storefront_db::Review;

use super::{SkipReason, TransformContext, TransformResult, Transformed, require_id};
use crate::entity::EntityKind;
use crate::record::LegacyRecord;

/// Build a review document. Both the author and the product must already
/// be migrated, and `rating` must be numeric.
pub fn transform_review(
    record: &LegacyRecord,
    ctx: &TransformContext<'_>,
) -> TransformResult<Review> {
    let legacy_id = require_id(record)?;
    let user = ctx.resolve(record, "user_id", EntityKind::User)?;
    let product = ctx.resolve(record, "product_id", EntityKind::Product)?;

    let rating = match record.get("rating") {
        None => return Err(SkipReason::MissingField { field: "rating" }),
        Some(raw) => record.float("rating").ok_or_else(|| SkipReason::InvalidField {
            field: "rating",
            value: raw.to_string(),
        })?,
    };

    let created_at = ctx.timestamp(record, "created_at");
    let review = Review {
        user,
        product,
        rating,
        comment: record.text("comment").unwrap_or_default(),
        created_at,
        updated_at: record.timestamp("updated_at").unwrap_or(created_at),
    };

    Ok(Transformed::new(legacy_id, review))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use storefront_db::DocumentId;

    use super::*;
    use crate::identity::IdentityMap;

    fn record(value: serde_json::Value) -> LegacyRecord {
        serde_json::from_value(value).unwrap()
    }

    fn ids() -> IdentityMap {
        let mut ids = IdentityMap::new();
        ids.register(EntityKind::User, 1, DocumentId::from("u1"));
        ids.register(EntityKind::Product, 10, DocumentId::from("p10"));
        ids
    }

    #[test]
    fn test_review_references() {
        let ids = ids();
        let ctx = TransformContext::new(&ids, Utc::now());

        let out = transform_review(
            &record(json!({
                "id": 5, "user_id": 1, "product_id": "10", "rating": "4", "comment": "Bright",
            })),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.document.user, DocumentId::from("u1"));
        assert_eq!(out.document.product, DocumentId::from("p10"));
        assert_eq!(out.document.rating, 4.0);
        assert_eq!(out.document.comment, "Bright");
    }

    #[test]
    fn test_unmapped_product_skips() {
        let ids = ids();
        let ctx = TransformContext::new(&ids, Utc::now());

        assert_eq!(
            transform_review(
                &record(json!({ "id": 6, "user_id": 1, "product_id": 99, "rating": 5 })),
                &ctx,
            ),
            Err(SkipReason::UnmappedReference {
                field: "product_id",
                kind: EntityKind::Product,
                legacy_id: 99,
            })
        );
    }

    #[test]
    fn test_rating_required() {
        let ids = ids();
        let ctx = TransformContext::new(&ids, Utc::now());

        assert_eq!(
            transform_review(&record(json!({ "id": 7, "user_id": 1, "product_id": 10 })), &ctx),
            Err(SkipReason::MissingField { field: "rating" })
        );
        assert!(matches!(
            transform_review(
                &record(json!({ "id": 8, "user_id": 1, "product_id": 10, "rating": "great" })),
                &ctx,
            ),
            Err(SkipReason::InvalidField { field: "rating", .. })
        ));
    }
}
