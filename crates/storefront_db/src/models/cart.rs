//! Cart documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// A user's shopping cart. One per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user: DocumentId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: DocumentId,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}
