use storefront_db::{JsonObject, Order, OrderItem, OrderStatus, PaymentStatus};

use super::{Embedded, FieldIssue, TransformContext, TransformResult, Transformed, quantity, require_id};
use crate::entity::EntityKind;
use crate::record::LegacyRecord;

/// Build an order from its `orders` row and `order_items` rows.
///
/// Lines whose product was not migrated are dropped; the order is kept as
/// long as its user was migrated.
pub fn transform_order(
    record: &LegacyRecord,
    lines: &[LegacyRecord],
    ctx: &TransformContext<'_>,
) -> TransformResult<Order> {
    let legacy_id = require_id(record)?;
    let user = ctx.resolve(record, "user_id", EntityKind::User)?;

    let mut issues = Vec::new();
    let mut items = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let product = match ctx.resolve(line, "product_id", EntityKind::Product) {
            Ok(product) => product,
            Err(reason) => {
                issues.push(FieldIssue::new(
                    format!("items[{index}]"),
                    reason.to_string(),
                    "line dropped",
                ));
                continue;
            }
        };

        let price = line.float("price").unwrap_or_else(|| {
            issues.push(FieldIssue::new(
                format!("items[{index}].price"),
                "missing or invalid unit price",
                "set to 0",
            ));
            0.0
        });

        items.push(OrderItem {
            product,
            quantity: quantity(line, &format!("items[{index}].quantity"), &mut issues),
            price,
            color: line.text("color"),
            size: line.text("size"),
        });
    }

    let mut declared_total = None;
    for field in ["total_amount", "total"] {
        let Some(raw) = record.get(field) else {
            continue;
        };
        match record.float(field) {
            Some(total) => {
                declared_total = Some(total);
                break;
            }
            None => issues.push(FieldIssue::new(
                field,
                format!("invalid total {raw}"),
                "recomputed from items",
            )),
        }
    }
    let total_amount = declared_total.unwrap_or_else(|| {
        items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum()
    });

    let status = match record.text("status") {
        None => OrderStatus::default(),
        Some(raw) => OrderStatus::parse(&raw).unwrap_or_else(|| {
            issues.push(FieldIssue::new(
                "status",
                format!("unknown order status {raw:?}"),
                "set to pending",
            ));
            OrderStatus::default()
        }),
    };

    let payment_status = match record.text("payment_status") {
        None => PaymentStatus::default(),
        Some(raw) => PaymentStatus::parse(&raw).unwrap_or_else(|| {
            issues.push(FieldIssue::new(
                "payment_status",
                format!("unknown payment status {raw:?}"),
                "set to pending",
            ));
            PaymentStatus::default()
        }),
    };

    let shipping_address: JsonObject = Embedded::decode(record.get("shipping_address"))
        .or_default("shipping_address", &mut issues);

    let created_at = ctx.timestamp(record, "created_at");
    let order = Order {
        user,
        items,
        total_amount,
        status,
        payment_method: record.text("payment_method"),
        payment_status,
        shipping_address,
        created_at,
        updated_at: record.timestamp("updated_at").unwrap_or(created_at),
    };

    Ok(Transformed::new(legacy_id, order).with_issues(issues))
}
