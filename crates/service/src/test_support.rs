#![cfg(test)]
use std::sync::Arc;

use configs::DeletionPolicy;
use models::ReviewPayload;

use crate::clock::ManualClock;
use crate::file::review_store::FileReviewStore;
use crate::ids::SequentialIds;
use crate::reviews::service::ReviewService;
use crate::storage::json_map_store::StoreLimits;

pub struct Harness {
    pub service: ReviewService<FileReviewStore>,
    pub clock: Arc<ManualClock>,
}

/// Fresh in-memory service with a manual clock and `review-NNNNNNNN` ids.
pub fn memory_service(deletion: DeletionPolicy) -> Harness {
    common::utils::logging::init_logging_default();
    let clock = Arc::new(ManualClock::starting_at(1));
    let service = ReviewService::new(
        FileReviewStore::in_memory(StoreLimits::default()),
        clock.clone(),
        Arc::new(SequentialIds::new("review")),
        deletion,
    );
    Harness { service, clock }
}

pub fn payload(body: &str, rating: f64) -> ReviewPayload {
    ReviewPayload::new(body, rating, "https://example.com")
}
