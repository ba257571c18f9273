use storefront_db::Wishlist;

use super::{FieldIssue, TransformContext, TransformResult, Transformed, require_id};
use crate::entity::EntityKind;
use crate::record::LegacyRecord;

/// Build a wishlist from its `wishlists` row and `wishlist_item` rows.
///
/// Items whose product was not migrated are dropped; the wishlist is kept.
pub fn transform_wishlist(
    record: &LegacyRecord,
    items: &[LegacyRecord],
    ctx: &TransformContext<'_>,
) -> TransformResult<Wishlist> {
    let legacy_id = require_id(record)?;
    let user = ctx.resolve(record, "user_id", EntityKind::User)?;

    let mut issues = Vec::new();
    let mut products = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match ctx.resolve(item, "product_id", EntityKind::Product) {
            Ok(product) if products.contains(&product) => {}
            Ok(product) => products.push(product),
            Err(reason) => issues.push(FieldIssue::new(
                format!("products[{index}]"),
                reason.to_string(),
                "item dropped",
            )),
        }
    }

    let created_at = ctx.timestamp(record, "created_at");
    let wishlist = Wishlist {
        user,
        products,
        created_at,
        updated_at: record.timestamp("updated_at").unwrap_or(created_at),
    };

    Ok(Transformed::new(legacy_id, wishlist).with_issues(issues))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use storefront_db::DocumentId;

    use super::*;
    use crate::identity::IdentityMap;
    use crate::transform::SkipReason;

    fn record(value: serde_json::Value) -> LegacyRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_unmapped_items_dropped() {
        let mut ids = IdentityMap::new();
        ids.register(EntityKind::User, 1, DocumentId::from("u1"));
        ids.register(EntityKind::Product, 10, DocumentId::from("p10"));
        ids.register(EntityKind::Product, 11, DocumentId::from("p11"));
        let ctx = TransformContext::new(&ids, Utc::now());

        let items = vec![
            record(json!({ "wishlist_id": 4, "product_id": 10 })),
            record(json!({ "wishlist_id": 4, "product_id": 404 })),
            record(json!({ "wishlist_id": 4, "product_id": 11 })),
            record(json!({ "wishlist_id": 4, "product_id": 10 })),
        ];
        let out = transform_wishlist(&record(json!({ "id": 4, "user_id": 1 })), &items, &ctx)
            .unwrap();

        assert_eq!(
            out.document.products,
            vec![DocumentId::from("p10"), DocumentId::from("p11")]
        );
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].field, "products[1]");
    }

    #[test]
    fn test_unmapped_user_skips() {
        let ids = IdentityMap::new();
        let ctx = TransformContext::new(&ids, Utc::now());
        assert!(matches!(
            transform_wishlist(&record(json!({ "id": 4, "user_id": 1 })), &[], &ctx),
            Err(SkipReason::UnmappedReference { field: "user_id", .. })
        ));
    }
}
