use storefront_db::{Cart, CartItem};

use super::{FieldIssue, SkipReason, TransformContext, TransformResult, Transformed, quantity};
use crate::entity::EntityKind;
use crate::record::LegacyRecord;

/// Build one cart from all `cart` rows of a user.
///
/// The legacy schema has no cart table, only entries keyed by `user_id`, so
/// the cart is registered under the user's legacy id.
pub fn transform_cart(
    user_legacy_id: i64,
    entries: &[LegacyRecord],
    ctx: &TransformContext<'_>,
) -> TransformResult<Cart> {
    let user = ctx
        .ids
        .lookup(EntityKind::User, user_legacy_id)
        .cloned()
        .ok_or(SkipReason::UnmappedReference {
            field: "user_id",
            kind: EntityKind::User,
            legacy_id: user_legacy_id,
        })?;

    let mut issues = Vec::new();
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let product = match ctx.resolve(entry, "product_id", EntityKind::Product) {
            Ok(product) => product,
            Err(reason) => {
                issues.push(FieldIssue::new(
                    format!("items[{index}]"),
                    reason.to_string(),
                    "item dropped",
                ));
                continue;
            }
        };

        items.push(CartItem {
            product,
            quantity: quantity(entry, &format!("items[{index}].quantity"), &mut issues),
            color: entry.text("color"),
            size: entry.text("size"),
        });
    }

    let created_at = entries
        .iter()
        .filter_map(|entry| entry.timestamp("created_at"))
        .min()
        .unwrap_or(ctx.now);
    let updated_at = entries
        .iter()
        .filter_map(|entry| entry.timestamp("updated_at").or(entry.timestamp("created_at")))
        .max()
        .unwrap_or(created_at);

    let cart = Cart {
        user,
        items,
        created_at,
        updated_at,
    };

    Ok(Transformed::new(user_legacy_id, cart).with_issues(issues))
}
