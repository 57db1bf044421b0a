//! Operation boundary.
//!
//! Every operation returns a `CallResult`: either the value or a
//! human-readable error string. Nothing else crosses this boundary.

use std::sync::Arc;

use models::{Review, ReviewPayload, Timestamp};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::metrics;
use crate::reviews::service::ReviewService;
use crate::reviews::store::ReviewStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CallResult<T> {
    Ok(T),
    Err(String),
}

impl<T> CallResult<T> {
    pub fn is_ok(&self) -> bool { matches!(self, CallResult::Ok(_)) }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            CallResult::Ok(v) => Ok(v),
            CallResult::Err(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for CallResult<T> {
    fn from(res: Result<T, ServiceError>) -> Self {
        match res {
            Ok(v) => CallResult::Ok(v),
            Err(e) => CallResult::Err(e.to_string()),
        }
    }
}

/// Read-only calls versus state-mutating calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Update,
}

pub const QUERY_OPERATIONS: &[&str] = &[
    "getReviews",
    "getReview",
    "getTotalReviewCount",
    "getAverageRating",
    "getLatestReviews",
    "reviewExists",
    "getReviewsWithMinRating",
    "getReviewsCreatedAfter",
    "getReviewsUpdatedAfter",
];

pub const UPDATE_OPERATIONS: &[&str] = &[
    "addReview",
    "addReviewWithCustomID",
    "updateReview",
    "deleteReview",
    "clearAllReviews",
];

pub fn operation_kind(name: &str) -> Option<OperationKind> {
    if QUERY_OPERATIONS.contains(&name) {
        Some(OperationKind::Query)
    } else if UPDATE_OPERATIONS.contains(&name) {
        Some(OperationKind::Update)
    } else {
        None
    }
}

pub struct ReviewApi<S: ReviewStore> {
    service: Arc<ReviewService<S>>,
}

impl<S: ReviewStore> Clone for ReviewApi<S> {
    fn clone(&self) -> Self { Self { service: self.service.clone() } }
}

fn finish<T>(operation: &str, res: Result<T, ServiceError>) -> CallResult<T> {
    metrics::observe(operation, &res);
    res.into()
}

impl<S: ReviewStore> ReviewApi<S> {
    pub fn new(service: Arc<ReviewService<S>>) -> Self { Self { service } }

    pub async fn get_reviews(&self) -> CallResult<Vec<Review>> {
        finish("getReviews", Ok(self.service.list_reviews().await))
    }

    pub async fn get_review(&self, id: &str) -> CallResult<Review> {
        finish("getReview", self.service.get_review(id).await)
    }

    pub async fn get_total_review_count(&self) -> CallResult<u64> {
        let count = self.service.get_total_count().await as u64;
        finish("getTotalReviewCount", Ok(count))
    }

    pub async fn get_average_rating(&self) -> CallResult<f64> {
        finish("getAverageRating", self.service.get_average_rating().await)
    }

    /// `count <= 0` is an invalid argument.
    pub async fn get_latest_reviews(&self, count: i64) -> CallResult<Vec<Review>> {
        let res = match usize::try_from(count) {
            Ok(n) => self.service.get_latest_reviews(n).await,
            Err(_) => Err(ServiceError::InvalidArgument(format!("count must be greater than zero, got {count}"))),
        };
        finish("getLatestReviews", res)
    }

    pub async fn review_exists(&self, id: &str) -> CallResult<bool> {
        finish("reviewExists", Ok(self.service.review_exists(id).await))
    }

    pub async fn get_reviews_with_min_rating(&self, min_rating: f64) -> CallResult<Vec<Review>> {
        finish("getReviewsWithMinRating", Ok(self.service.get_reviews_with_min_rating(min_rating).await))
    }

    pub async fn get_reviews_created_after(&self, timestamp: Timestamp) -> CallResult<Vec<Review>> {
        finish("getReviewsCreatedAfter", Ok(self.service.get_reviews_created_after(timestamp).await))
    }

    pub async fn get_reviews_updated_after(&self, timestamp: Timestamp) -> CallResult<Vec<Review>> {
        finish("getReviewsUpdatedAfter", Ok(self.service.get_reviews_updated_after(timestamp).await))
    }

    pub async fn add_review(&self, payload: ReviewPayload) -> CallResult<Review> {
        finish("addReview", self.service.create_review(payload).await)
    }

    pub async fn add_review_with_custom_id(&self, id: String, payload: ReviewPayload) -> CallResult<Review> {
        finish("addReviewWithCustomID", self.service.create_review_with_id(id, payload).await)
    }

    pub async fn update_review(&self, id: &str, payload: ReviewPayload) -> CallResult<Review> {
        finish("updateReview", self.service.update_review(id, payload).await)
    }

    pub async fn delete_review(&self, id: &str) -> CallResult<Review> {
        finish("deleteReview", self.service.delete_review(id).await)
    }

    pub async fn clear_all_reviews(&self) -> CallResult<()> {
        finish("clearAllReviews", self.service.clear_all().await)
    }
}
