use storefront_db::{ColorOption, JsonObject, Product};

use super::{Embedded, FieldIssue, SkipReason, TransformContext, TransformResult, Transformed, require_id};
use crate::record::LegacyRecord;

/// Build a product document. Requires `id` and `name`.
///
/// `rating` and `review_count` always start at zero. Only the review pass
/// sets them, from the reviews that were actually written.
pub fn transform_product(
    record: &LegacyRecord,
    ctx: &TransformContext<'_>,
) -> TransformResult<Product> {
    let legacy_id = require_id(record)?;
    let name = record
        .text("name")
        .ok_or(SkipReason::MissingField { field: "name" })?;

    let mut issues = Vec::new();

    let price = match record.get("price") {
        None => 0.0,
        Some(raw) => record.float("price").unwrap_or_else(|| {
            issues.push(FieldIssue::new("price", format!("invalid price {raw}"), "set to 0"));
            0.0
        }),
    };

    let mut images: Vec<String> =
        Embedded::decode(record.get("images")).or_default("images", &mut issues);
    if images.is_empty() {
        if let Some(image) = record.text("image") {
            images.push(image);
        }
    }

    let specs: JsonObject = Embedded::decode(record.get("specs")).or_default("specs", &mut issues);
    let colors: Vec<ColorOption> =
        Embedded::decode(record.get("colors")).or_default("colors", &mut issues);
    let sizes: Vec<String> = Embedded::decode(record.get("sizes")).or_default("sizes", &mut issues);

    let created_at = ctx.timestamp(record, "created_at");
    let product = Product {
        name,
        description: record.text("description").unwrap_or_default(),
        price,
        discount: record.float("discount").unwrap_or(0.0),
        stock: record.int("stock").unwrap_or(0),
        category: record.text("category"),
        brand: record.text("brand"),
        images,
        specs,
        colors,
        sizes,
        rating: 0.0,
        review_count: 0,
        created_at,
        updated_at: record.timestamp("updated_at").unwrap_or(created_at),
    };

    Ok(Transformed::new(legacy_id, product).with_issues(issues))
}
