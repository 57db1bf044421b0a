use async_trait::async_trait;
use models::Review;

use crate::errors::ServiceError;

/// Durable ordered map from review id to review.
///
/// Reads never fail. Writes are atomic per key and either persist or leave
/// the previous value in place. `values` yields a snapshot in ascending id
/// order. Implementations can be file-backed, database-backed, or remote KV.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<Review>;
    /// Upsert; returns the replaced review, if any.
    async fn insert(&self, id: String, review: Review) -> Result<Option<Review>, ServiceError>;
    async fn remove(&self, id: &str) -> Result<Option<Review>, ServiceError>;
    async fn contains(&self, id: &str) -> bool;
    async fn values(&self) -> Vec<Review>;
    async fn size(&self) -> usize;
    async fn clear(&self) -> Result<(), ServiceError>;
    /// Where the reviews live; labels the stored-reviews gauge.
    fn location(&self) -> String;
}
