//! Review Management
//!
//! Every review mutation is followed by an average-rating recompute for the
//! affected restaurant.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateReviewRequest, CurrentUser, Review, UpdateReviewRequest};
use crate::service::restaurant::restaurant_not_found;
use crate::service::{ensure_owner, RatingAggregator};
use crate::store::{NewReview, ReviewChanges, Store};
use crate::utils::error::{AppError, AppResult};

fn review_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Review not found with id of {}", id))
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
    ratings: RatingAggregator,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            ratings: RatingAggregator::new(store.clone()),
            store,
        }
    }

    /// All reviews, or those of one existing restaurant
    pub async fn list(&self, restaurant: Option<Uuid>) -> AppResult<Vec<Review>> {
        if let Some(restaurant_id) = restaurant {
            if self.store.find_restaurant(restaurant_id).await?.is_none() {
                return Err(restaurant_not_found(restaurant_id));
            }
        }
        Ok(self.store.list_reviews(restaurant).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Review> {
        self.store
            .find_review(id)
            .await?
            .ok_or_else(|| review_not_found(id))
    }

    /// Any signed-in user may review a restaurant once
    pub async fn create(
        &self,
        caller: &CurrentUser,
        restaurant_id: Uuid,
        request: CreateReviewRequest,
    ) -> AppResult<Review> {
        request.validate()?;
        if self.store.find_restaurant(restaurant_id).await?.is_none() {
            return Err(restaurant_not_found(restaurant_id));
        }

        let review = self
            .store
            .insert_review(NewReview {
                title: request.title.trim().to_string(),
                text: request.text.trim().to_string(),
                rating: request.rating,
                restaurant: restaurant_id,
                user: caller.id,
            })
            .await?;

        self.ratings.recompute(restaurant_id).await;
        Ok(review)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        request: UpdateReviewRequest,
    ) -> AppResult<Review> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "review")?;
        request.validate()?;

        let changes = ReviewChanges {
            title: request.title.map(|t| t.trim().to_string()),
            text: request.text.map(|t| t.trim().to_string()),
            rating: request.rating,
        };

        let review = self
            .store
            .update_review(id, changes)
            .await?
            .ok_or_else(|| review_not_found(id))?;

        self.ratings.recompute(review.restaurant).await;
        Ok(review)
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "review")?;

        if !self.store.delete_review(id).await? {
            return Err(review_not_found(id));
        }

        self.ratings.recompute(existing.restaurant).await;
        Ok(())
    }
}
