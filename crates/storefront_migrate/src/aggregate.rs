//! Product rating recomputation.

use std::collections::BTreeMap;

use storefront_db::{DbError, DocumentId, DocumentStore};
use tracing::{debug, warn};

/// Running rating totals per product, fed with written reviews only.
#[derive(Debug, Default, Clone)]
pub struct RatingAccumulator {
    totals: BTreeMap<DocumentId, RatingTotal>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct RatingTotal {
    sum: f64,
    count: u64,
}

/// Result of applying the accumulated ratings.
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    pub updated: usize,
    pub failed: Vec<(DocumentId, DbError)>,
}

impl RatingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, product: &DocumentId, rating: f64) {
        let total = self.totals.entry(product.clone()).or_default();
        total.sum += rating;
        total.count += 1;
    }

    /// `(rating, review_count)` for a product, rating rounded to one decimal.
    pub fn rating(&self, product: &DocumentId) -> Option<(f64, u64)> {
        self.totals
            .get(product)
            .map(|total| (round_one_decimal(total.sum / total.count as f64), total.count))
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Write rating and review count to every product that received
    /// reviews. A failed update is logged and the rest still run.
    pub async fn apply(&self, store: &dyn DocumentStore) -> AggregateOutcome {
        let mut outcome = AggregateOutcome::default();
        for product in self.totals.keys() {
            let Some((rating, count)) = self.rating(product) else {
                continue;
            };
            match store.set_product_rating(product, rating, count).await {
                Ok(()) => {
                    debug!(%product, rating, review_count = count, "Updated product rating");
                    outcome.updated += 1;
                }
                Err(e) => {
                    warn!(%product, error = %e, "Failed to update product rating");
                    outcome.failed.push((product.clone(), e));
                }
            }
        }
        outcome
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
