//! Entity kinds, the unit of migration sequencing.

use std::fmt;

use serde::{Deserialize, Serialize};
use storefront_db::Collection;

/// One of the migrated entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Product,
    Review,
    Wishlist,
    Cart,
    Order,
}

impl EntityKind {
    /// Fixed pass order. Every kind comes after the kinds it references.
    pub const MIGRATION_ORDER: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Product,
        EntityKind::Review,
        EntityKind::Wishlist,
        EntityKind::Cart,
        EntityKind::Order,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Product => "product",
            EntityKind::Review => "review",
            EntityKind::Wishlist => "wishlist",
            EntityKind::Cart => "cart",
            EntityKind::Order => "order",
        }
    }

    /// Target collection for documents of this kind.
    pub fn collection(&self) -> Collection {
        match self {
            EntityKind::User => Collection::Users,
            EntityKind::Product => Collection::Products,
            EntityKind::Review => Collection::Reviews,
            EntityKind::Wishlist => Collection::Wishlists,
            EntityKind::Cart => Collection::Carts,
            EntityKind::Order => Collection::Orders,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_kinds_come_first() {
        let position = |kind| {
            EntityKind::MIGRATION_ORDER
                .iter()
                .position(|k| *k == kind)
                .unwrap()
        };
        for dependent in [
            EntityKind::Review,
            EntityKind::Wishlist,
            EntityKind::Cart,
            EntityKind::Order,
        ] {
            assert!(position(EntityKind::User) < position(dependent));
            assert!(position(EntityKind::Product) < position(dependent));
        }
    }
}
