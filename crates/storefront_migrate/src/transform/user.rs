use storefront_db::{JsonObject, User, UserRole};

use super::{Embedded, FieldIssue, SkipReason, TransformContext, TransformResult, Transformed, require_id};
use crate::record::LegacyRecord;

/// Build a user document. Requires `id` and `email`.
pub fn transform_user(record: &LegacyRecord, ctx: &TransformContext<'_>) -> TransformResult<User> {
    let legacy_id = require_id(record)?;
    let email = record
        .text("email")
        .ok_or(SkipReason::MissingField { field: "email" })?
        .to_lowercase();

    let mut issues = Vec::new();

    let name = record
        .text("name")
        .or_else(|| {
            let parts: Vec<String> = ["first_name", "last_name"]
                .iter()
                .filter_map(|field| record.text(field))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        })
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let role = match record.text("role") {
        Some(raw) => UserRole::parse(&raw).unwrap_or_else(|| {
            issues.push(FieldIssue::new(
                "role",
                format!("unknown role {raw:?}"),
                "set to user",
            ));
            UserRole::User
        }),
        None if record.flag("is_admin") == Some(true) => UserRole::Admin,
        None => UserRole::User,
    };

    let social_links: JsonObject =
        Embedded::decode(record.get("social_links")).or_default("social_links", &mut issues);
    let shipping_address: JsonObject = Embedded::decode(record.get("shipping_address"))
        .or_default("shipping_address", &mut issues);
    let payment_methods: Vec<serde_json::Value> = Embedded::decode(record.get("payment_methods"))
        .or_default("payment_methods", &mut issues);

    let created_at = ctx.timestamp(record, "created_at");
    let user = User {
        name,
        email,
        password: record.text("password"),
        avatar: record.text("avatar"),
        role,
        phone: record.text("phone"),
        google_id: record.text("google_id"),
        facebook_id: record.text("facebook_id"),
        social_links,
        shipping_address,
        payment_methods,
        created_at,
        updated_at: record.timestamp("updated_at").unwrap_or(created_at),
    };

    Ok(Transformed::new(legacy_id, user).with_issues(issues))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::identity::IdentityMap;

    fn record(value: serde_json::Value) -> LegacyRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_user() {
        let ids = IdentityMap::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ctx = TransformContext::new(&ids, now);

        let out = transform_user(
            &record(json!({
                "id": 12,
                "name": "Ada Lovelace",
                "email": "Ada@Example.com",
                "password": "$2b$10$hash",
                "role": "admin",
                "phone": "555-0100",
                "social_links": "{\"twitter\":\"@ada\"}",
                "shipping_address": { "city": "London" },
                "payment_methods": "[{\"type\":\"card\",\"last4\":\"4242\"}]",
                "created_at": "2020-05-01 10:00:00",
            })),
            &ctx,
        )
        .unwrap();

        assert_eq!(out.legacy_id, 12);
        assert!(out.issues.is_empty());
        let user = out.document;
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.social_links.get("twitter"), Some(&json!("@ada")));
        assert_eq!(user.shipping_address.get("city"), Some(&json!("London")));
        assert_eq!(user.payment_methods, vec![json!({ "type": "card", "last4": "4242" })]);
        assert_eq!(user.created_at, Utc.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(user.updated_at, user.created_at);
        assert!(user.avatar.is_none());
    }

    #[test]
    fn test_defaults_and_malformed_json() {
        let ids = IdentityMap::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ctx = TransformContext::new(&ids, now);

        let out = transform_user(
            &record(json!({
                "id": "3",
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com",
                "is_admin": 1,
                "social_links": "{broken",
            })),
            &ctx,
        )
        .unwrap();

        let user = out.document;
        assert_eq!(user.name, "Grace Hopper");
        assert_eq!(user.role, UserRole::Admin);
        assert!(user.social_links.is_empty());
        assert!(user.password.is_none());
        assert_eq!(user.created_at, now);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].field, "social_links");
    }

    #[test]
    fn test_missing_email_skips() {
        let ids = IdentityMap::new();
        let ctx = TransformContext::new(&ids, Utc::now());
        assert_eq!(
            transform_user(&record(json!({ "id": 1, "name": "Nobody" })), &ctx),
            Err(SkipReason::MissingField { field: "email" })
        );
    }
}
