//! Product documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonObject;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub price: f64,

    /// Discount percentage
    pub discount: f64,

    /// Units in stock
    pub stock: i64,

    pub category: Option<String>,
    pub brand: Option<String>,

    /// Image URLs
    pub images: Vec<String>,

    /// Technical specifications keyed by label
    pub specs: JsonObject,

    pub colors: Vec<ColorOption>,
    pub sizes: Vec<String>,

    /// Average review rating, one decimal place
    pub rating: f64,
    pub review_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A selectable color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    /// Human-readable name, e.g. "Red"
    pub name: String,
    /// CSS color value, e.g. "#F00"
    pub value: String,
}
