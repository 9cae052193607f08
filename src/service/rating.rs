//! Rating Aggregation
//!
//! Keeps a restaurant's average rating in step with its reviews.

use std::sync::Arc;

use log::{debug, error};
use uuid::Uuid;

use crate::store::Store;

/// Recomputes derived average ratings after review mutations
#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn Store>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Recompute the restaurant's average from its current reviews
    ///
    /// Runs as a single store statement. Failures are logged and swallowed:
    /// the review mutation that triggered the recompute has already been
    /// committed.
    pub async fn recompute(&self, restaurant_id: Uuid) -> Option<f64> {
        match self.store.recompute_average_rating(restaurant_id).await {
            Ok(average) => {
                debug!(
                    "Average rating for restaurant {} is now {:?}",
                    restaurant_id, average
                );
                average
            }
            Err(e) => {
                error!(
                    "Failed to recompute average rating for restaurant {}: {}",
                    restaurant_id, e
                );
                None
            }
        }
    }
}
