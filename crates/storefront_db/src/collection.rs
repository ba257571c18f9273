//! Collection names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Products,
    Reviews,
    Wishlists,
    Carts,
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Products,
        Collection::Reviews,
        Collection::Wishlists,
        Collection::Carts,
        Collection::Orders,
    ];

    /// Table name used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Products => "products",
            Collection::Reviews => "reviews",
            Collection::Wishlists => "wishlists",
            Collection::Carts => "carts",
            Collection::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
