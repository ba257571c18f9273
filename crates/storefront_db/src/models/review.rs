//! Review documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Author
    pub user: DocumentId,
    pub product: DocumentId,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
