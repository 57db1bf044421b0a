use std::sync::Arc;

use configs::DeletionPolicy;
use models::{Review, ReviewPayload};
use service::clock::ManualClock;
use service::errors::ServiceError;
use service::file::review_store::FileReviewStore;
use service::ids::SequentialIds;
use service::storage::json_map_store::StoreLimits;
use service::ReviewService;

fn setup(deletion: DeletionPolicy) -> (ReviewService<FileReviewStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_at(1_000));
    let svc = ReviewService::new(
        FileReviewStore::in_memory(StoreLimits::default()),
        clock.clone(),
        Arc::new(SequentialIds::new("prop")),
        deletion,
    );
    (svc, clock)
}

fn payloads() -> Vec<ReviewPayload> {
    vec![
        ReviewPayload::new("Fast checkout", 5.0, "https://shop.example"),
        ReviewPayload::new("x", 0.0, "h"),
        ReviewPayload::new("Lots of ads", -2.5, "https://news.example/a?b=c"),
        ReviewPayload::new("   ", 1000.0, "ftp://legacy.example"),
        ReviewPayload::new("unicode ✓ body", 3.25, "https://例え.jp"),
    ]
}

#[tokio::test]
async fn every_valid_payload_round_trips() -> Result<(), ServiceError> {
    let (svc, clock) = setup(DeletionPolicy::Enabled);
    for p in payloads() {
        clock.advance(7);
        let created = svc.create_review(p.clone()).await?;
        assert_eq!(created.body, p.body);
        assert_eq!(Some(created.rating), p.rating);
        assert_eq!(created.website_url, p.website_url);
        assert_eq!(svc.get_review(&created.id).await?, created);
    }
    assert_eq!(svc.get_total_count().await, payloads().len());
    Ok(())
}

#[tokio::test]
async fn custom_id_twice_adds_exactly_one() -> Result<(), ServiceError> {
    let (svc, _) = setup(DeletionPolicy::Enabled);
    let before = svc.get_total_count().await;
    svc.create_review_with_id("fixed-id".into(), payloads()[0].clone()).await?;
    let second = svc.create_review_with_id("fixed-id".into(), payloads()[1].clone()).await;
    assert!(matches!(second, Err(ServiceError::AlreadyExists(_))));
    assert_eq!(svc.get_total_count().await, before + 1);
    Ok(())
}

#[tokio::test]
async fn updates_keep_identity_and_order_timestamps() -> Result<(), ServiceError> {
    let (svc, clock) = setup(DeletionPolicy::Enabled);
    let mut created: Vec<Review> = Vec::new();
    for p in payloads() {
        clock.advance(10);
        created.push(svc.create_review(p).await?);
    }

    // even a clock set back to zero cannot push updated_at below created_at
    clock.set(0);
    for r in &created {
        let updated = svc.update_review(&r.id, ReviewPayload::new("rewritten", 2.0, "https://e.x")).await?;
        assert_eq!(updated.id, r.id);
        assert_eq!(updated.created_at, r.created_at);
        let stamp = updated.updated_at.expect("stamped");
        assert!(stamp >= updated.created_at);
    }

    clock.set(5_000);
    let again = svc.update_review(&created[0].id, payloads()[0].clone()).await?;
    assert_eq!(again.updated_at, Some(5_000));
    Ok(())
}

#[tokio::test]
async fn average_matches_examples() -> Result<(), ServiceError> {
    let (svc, _) = setup(DeletionPolicy::Enabled);
    assert!(matches!(svc.get_average_rating().await, Err(ServiceError::EmptyCollection)));
    svc.create_review(ReviewPayload::new("a", 5.0, "u")).await?;
    assert_eq!(svc.get_average_rating().await?, 5.0);
    svc.create_review(ReviewPayload::new("b", 3.0, "u")).await?;
    assert_eq!(svc.get_average_rating().await?, 4.0);
    Ok(())
}

#[tokio::test]
async fn latest_n_boundaries() -> Result<(), ServiceError> {
    let (svc, _) = setup(DeletionPolicy::Enabled);
    assert!(matches!(svc.get_latest_reviews(0).await, Err(ServiceError::InvalidArgument(_))));
    for p in payloads() {
        svc.create_review(p).await?;
    }
    let all = svc.list_reviews().await;
    assert_eq!(svc.get_latest_reviews(100).await?, all);
    assert_eq!(svc.get_latest_reviews(2).await?, all[all.len() - 2..].to_vec());
    Ok(())
}

#[tokio::test]
async fn created_after_is_strict_across_mixed_timestamps() -> Result<(), ServiceError> {
    let (svc, clock) = setup(DeletionPolicy::Enabled);
    let stamps = [50u64, 100, 100, 150, 99, 101];
    for (i, ts) in stamps.iter().enumerate() {
        clock.set(*ts);
        svc.create_review(ReviewPayload::new(format!("r{i}"), 1.0, "u")).await?;
    }
    let pivot = 100;
    let got = svc.get_reviews_created_after(pivot).await;
    let expected: Vec<Review> = svc.list_reviews().await.into_iter().filter(|r| r.created_at > pivot).collect();
    assert_eq!(got, expected);
    assert_eq!(got.iter().map(|r| r.created_at).collect::<Vec<_>>(), vec![150, 101]);
    Ok(())
}

#[tokio::test]
async fn updated_after_skips_never_updated() -> Result<(), ServiceError> {
    let (svc, clock) = setup(DeletionPolicy::Enabled);
    let a = svc.create_review(payloads()[0].clone()).await?;
    let _b = svc.create_review(payloads()[1].clone()).await?;
    clock.set(2_000);
    svc.update_review(&a.id, payloads()[2].clone()).await?;

    let got = svc.get_reviews_updated_after(0).await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].id, a.id);
    Ok(())
}

#[tokio::test]
async fn deletion_policy_is_applied_consistently() -> Result<(), ServiceError> {
    let (enabled, _) = setup(DeletionPolicy::Enabled);
    let r = enabled.create_review(payloads()[0].clone()).await?;
    enabled.delete_review(&r.id).await?;
    assert!(matches!(enabled.get_review(&r.id).await, Err(ServiceError::NotFound(_))));

    let (disabled, _) = setup(DeletionPolicy::Disabled);
    let r = disabled.create_review(payloads()[0].clone()).await?;
    assert_eq!(disabled.delete_review(&r.id).await, Err(ServiceError::DeletionDisabled));
    assert_eq!(disabled.get_review(&r.id).await?, r);
    Ok(())
}

#[tokio::test]
async fn clear_then_count_is_zero() -> Result<(), ServiceError> {
    let (svc, _) = setup(DeletionPolicy::Enabled);
    for p in payloads() {
        svc.create_review(p).await?;
    }
    svc.clear_all().await?;
    assert_eq!(svc.get_total_count().await, 0);
    assert!(svc.list_reviews().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_custom_id_creation_admits_one_winner() -> Result<(), ServiceError> {
    let (svc, _) = setup(DeletionPolicy::Enabled);
    let svc = Arc::new(svc);
    let mut handles = Vec::new();
    for i in 0..16 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.create_review_with_id("contested".into(), ReviewPayload::new(format!("writer {i}"), 1.0, "u")).await
        }));
    }
    let mut winners = 0;
    for h in handles {
        match h.await.expect("task") {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, ServiceError::AlreadyExists(_))),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(svc.get_total_count().await, 1);
    Ok(())
}
