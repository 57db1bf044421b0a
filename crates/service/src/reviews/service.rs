use std::sync::Arc;

use configs::{AppConfig, DeletionPolicy, StorageBackend};
use models::{Review, ReviewPayload, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::ServiceError;
use crate::file::review_store::FileReviewStore;
use crate::ids::{IdGenerator, UuidV4Ids};
use crate::metrics;
use crate::pagination::Pagination;
use crate::reviews::store::ReviewStore;
use crate::storage::json_map_store::StoreLimits;

/// Application service encapsulating review business rules.
///
/// Holds no review state of its own; the store owns every record. Mutations
/// are serialised through one lock so that check-then-write sequences
/// (`create_review_with_id`, `update_review`) cannot interleave.
pub struct ReviewService<S: ReviewStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    deletion: DeletionPolicy,
    writes: Mutex<()>,
}

impl ReviewService<FileReviewStore> {
    /// Build the production wiring: configured store, wall clock, v4 ids.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let limits = StoreLimits::from_config(&cfg.storage);
        let store = match cfg.storage.backend {
            StorageBackend::File => FileReviewStore::open(&cfg.storage.path, limits).await?,
            StorageBackend::Memory => FileReviewStore::in_memory(limits),
        };
        let service = Self::new(
            store,
            Arc::new(SystemClock::new()),
            Arc::new(UuidV4Ids),
            cfg.reviews.deletion,
        );
        let stored = service.refresh_stored_gauge().await;
        info!(
            backend = ?cfg.storage.backend,
            path = %cfg.storage.path,
            deletion = %cfg.reviews.deletion,
            stored,
            "review_store_opened"
        );
        Ok(service)
    }
}

impl<S: ReviewStore> ReviewService<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        deletion: DeletionPolicy,
    ) -> Self {
        Self { store, clock, ids, deletion, writes: Mutex::new(()) }
    }

    pub fn deletion_policy(&self) -> DeletionPolicy { self.deletion }

    async fn refresh_stored_gauge(&self) -> usize {
        let count = self.store.size().await;
        metrics::set_stored(&self.store.location(), count);
        count
    }

    /// Write `review` under its id; `action` names the write in storage errors.
    async fn persist(&self, review: &Review, action: &str) -> Result<(), ServiceError> {
        if let Err(e) = self.store.insert(review.id.clone(), review.clone()).await {
            warn!(review_id = %review.id, error = %e, "review_write_failed");
            return Err(e.during(action));
        }
        self.refresh_stored_gauge().await;
        Ok(())
    }

    /// Create a review under a freshly generated id.
    #[instrument(skip(self, payload))]
    pub async fn create_review(&self, payload: ReviewPayload) -> Result<Review, ServiceError> {
        payload.validate()?;
        let _guard = self.writes.lock().await;
        let review = Review::create(self.ids.next_id(), payload, self.clock.now())?;
        self.persist(&review, "create").await?;
        info!(review_id = %review.id, "review_created");
        Ok(review)
    }

    /// Create a review under a caller-chosen id; never overwrites.
    #[instrument(skip(self, payload))]
    pub async fn create_review_with_id(
        &self,
        id: String,
        payload: ReviewPayload,
    ) -> Result<Review, ServiceError> {
        if id.is_empty() {
            return Err(ServiceError::Validation("Invalid id: an id must not be empty".into()));
        }
        payload.validate()?;
        let _guard = self.writes.lock().await;
        if self.store.contains(&id).await {
            return Err(ServiceError::already_exists(&id));
        }
        let review = Review::create(id, payload, self.clock.now())?;
        self.persist(&review, "create").await?;
        info!(review_id = %review.id, "review_created_with_id");
        Ok(review)
    }

    pub async fn get_review(&self, id: &str) -> Result<Review, ServiceError> {
        self.store.get(id).await.ok_or_else(|| ServiceError::not_found(id))
    }

    /// All reviews in ascending id order.
    pub async fn list_reviews(&self) -> Vec<Review> {
        self.store.values().await
    }

    pub async fn list_reviews_page(&self, page: Pagination) -> Vec<Review> {
        page.slice(&self.store.values().await).to_vec()
    }

    pub async fn review_exists(&self, id: &str) -> bool {
        self.store.contains(id).await
    }

    /// Replace body, rating and website; `id` and `created_at` never change.
    #[instrument(skip(self, payload))]
    pub async fn update_review(
        &self,
        id: &str,
        payload: ReviewPayload,
    ) -> Result<Review, ServiceError> {
        if id.is_empty() {
            return Err(ServiceError::Validation("Invalid id: an id must not be empty".into()));
        }
        payload.validate()?;
        let _guard = self.writes.lock().await;
        let mut review =
            self.store.get(id).await.ok_or_else(|| ServiceError::update_not_found(id))?;
        review.apply_update(payload, self.clock.now())?;
        self.persist(&review, "update").await?;
        info!(review_id = %review.id, updated_at = ?review.updated_at, "review_updated");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, id: &str) -> Result<Review, ServiceError> {
        if !self.deletion.allows_deletion() {
            warn!(review_id = %id, "review_delete_rejected_by_policy");
            return Err(ServiceError::DeletionDisabled);
        }
        let _guard = self.writes.lock().await;
        let removed = self.store.remove(id).await?.ok_or_else(|| ServiceError::not_found(id))?;
        self.refresh_stored_gauge().await;
        info!(review_id = %id, "review_deleted");
        Ok(removed)
    }

    /// Remove every review. Subject to the same policy as `delete_review`.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<(), ServiceError> {
        if !self.deletion.allows_deletion() {
            warn!("review_clear_rejected_by_policy");
            return Err(ServiceError::DeletionDisabled);
        }
        let _guard = self.writes.lock().await;
        let removed = self.store.size().await;
        self.store.clear().await?;
        metrics::set_stored(&self.store.location(), 0);
        info!(removed, "reviews_cleared");
        Ok(())
    }

    pub async fn get_total_count(&self) -> usize {
        self.store.size().await
    }

    pub async fn get_average_rating(&self) -> Result<f64, ServiceError> {
        let reviews = self.store.values().await;
        if reviews.is_empty() {
            return Err(ServiceError::EmptyCollection);
        }
        let sum: f64 = reviews.iter().map(|r| r.rating).sum();
        Ok(sum / reviews.len() as f64)
    }

    /// The last `n` reviews in id order; fewer when the store is smaller.
    pub async fn get_latest_reviews(&self, n: usize) -> Result<Vec<Review>, ServiceError> {
        if n == 0 {
            return Err(ServiceError::InvalidArgument("count must be greater than zero".into()));
        }
        let mut reviews = self.store.values().await;
        let start = reviews.len().saturating_sub(n);
        debug!(requested = n, returned = reviews.len() - start, "latest_reviews");
        Ok(reviews.split_off(start))
    }

    pub async fn get_reviews_with_min_rating(&self, min: f64) -> Vec<Review> {
        self.filtered(|r| r.rating >= min).await
    }

    /// Reviews created strictly after `ts`.
    pub async fn get_reviews_created_after(&self, ts: Timestamp) -> Vec<Review> {
        self.filtered(|r| r.created_at > ts).await
    }

    /// Reviews updated strictly after `ts`; never-updated reviews are excluded.
    pub async fn get_reviews_updated_after(&self, ts: Timestamp) -> Vec<Review> {
        self.filtered(|r| matches!(r.updated_at, Some(updated) if updated > ts)).await
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Review>
    where
        F: Fn(&Review) -> bool,
    {
        let mut reviews = self.store.values().await;
        reviews.retain(|r| keep(r));
        debug!(matched = reviews.len(), "filtered_reviews");
        reviews
    }
}
