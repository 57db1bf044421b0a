use std::{path::PathBuf, sync::Arc};

use models::Review;

use crate::errors::ServiceError;
use crate::reviews::store::ReviewStore;
use crate::storage::json_map_store::{JsonMapStore, StoreLimits};

/// Review table persisted as a JSON object keyed by review id.
#[derive(Clone)]
pub struct FileReviewStore {
    store: Arc<JsonMapStore<String, Review>>,
}

impl FileReviewStore {
    /// Open the table at `path`, creating an empty one if missing.
    pub async fn open<P: Into<PathBuf>>(
        path: P,
        limits: StoreLimits,
    ) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, Review>::open(path, limits).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Volatile table, nothing touches the filesystem.
    pub fn in_memory(limits: StoreLimits) -> Arc<Self> {
        Arc::new(Self { store: JsonMapStore::in_memory(limits) })
    }
}

#[async_trait::async_trait]
impl ReviewStore for FileReviewStore {
    async fn get(&self, id: &str) -> Option<Review> { self.store.get(&id.to_string()).await }

    async fn insert(&self, id: String, review: Review) -> Result<Option<Review>, ServiceError> {
        self.store.insert(id, review).await
    }

    async fn remove(&self, id: &str) -> Result<Option<Review>, ServiceError> {
        self.store.remove(&id.to_string()).await
    }

    async fn contains(&self, id: &str) -> bool { self.store.contains_key(&id.to_string()).await }
    async fn values(&self) -> Vec<Review> { self.store.values().await }
    async fn size(&self) -> usize { self.store.len().await }
    async fn clear(&self) -> Result<(), ServiceError> { self.store.clear().await }

    fn location(&self) -> String {
        match self.store.file_path() {
            Some(path) => path.display().to_string(),
            None => "memory".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::ReviewPayload;
    use uuid::Uuid;

    fn review(id: &str, rating: f64) -> Review {
        let payload = ReviewPayload::new("body", rating, "https://example.com");
        Review::create(id.into(), payload, 1).expect("valid")
    }

    #[tokio::test]
    async fn review_store_survives_reopen() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("svc_reviews_{}.json", Uuid::new_v4()));
        let store = FileReviewStore::open(&tmp, StoreLimits::default()).await?;
        assert_eq!(store.location(), tmp.display().to_string());

        // initially empty
        assert_eq!(store.size().await, 0);

        store.insert("b".into(), review("b", 2.0)).await?;
        store.insert("a".into(), review("a", 4.0)).await?;
        assert!(store.contains("a").await);
        assert_eq!(store.remove("b").await?.map(|r| r.rating), Some(2.0));

        // reload store from disk to ensure persistence
        let store2 = FileReviewStore::open(&tmp, StoreLimits::default()).await?;
        assert_eq!(store2.values().await, vec![review("a", 4.0)]);
        assert_eq!(store2.get("a").await, Some(review("a", 4.0)));
        assert_eq!(store2.get("b").await, None);

        store2.clear().await?;
        assert_eq!(FileReviewStore::open(&tmp, StoreLimits::default()).await?.size().await, 0);

        // cleanup
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn oversized_review_is_a_storage_failure() {
        let limits = StoreLimits { max_key_bytes: 64, max_value_bytes: 256 };
        let store = FileReviewStore::in_memory(limits);
        let mut big = review("a", 1.0);
        big.body = "x".repeat(512);
        assert!(matches!(store.insert("a".into(), big).await, Err(ServiceError::Storage(_))));
        assert_eq!(store.size().await, 0);
        assert_eq!(store.location(), "memory");
    }
}
