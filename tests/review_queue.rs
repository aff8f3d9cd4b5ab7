mod common;

use chrono::{Duration, Utc};
use common::verification;
use std::sync::Arc;
use uuid::Uuid;
use veriflow_backend::database::sqlite::SqliteDatabase;
use veriflow_backend::errors::AppError;
use veriflow_backend::models::appeal::AppealRecord;
use veriflow_backend::models::verification::{VerificationRecord, VerificationStatus};
use veriflow_backend::services::review_queue::ReviewQueueService;

async fn setup() -> (Arc<SqliteDatabase>, ReviewQueueService) {
    let store = Arc::new(SqliteDatabase::in_memory().await.unwrap());
    let queues = ReviewQueueService::new(store.clone());
    (store, queues)
}

/// Four same-status records created in order A, B, C, D.
async fn seed_four(store: &SqliteDatabase, status: VerificationStatus) -> Vec<VerificationRecord> {
    let base = Utc::now();
    let mut records = Vec::new();
    for i in 0..4 {
        let record = verification("emp-queue", status, base + Duration::seconds(i));
        store.create_verification(&record).await.unwrap();
        records.push(record);
    }
    records
}

#[tokio::test]
async fn pages_run_newest_first_with_cursor_handoff() {
    let (store, queues) = setup().await;
    let records = seed_four(&store, VerificationStatus::Pending).await;
    let (a, b, c, d) = (&records[0], &records[1], &records[2], &records[3]);

    let first = queues
        .list_verifications(VerificationStatus::Pending, Some(2), None)
        .await
        .unwrap();
    assert_eq!(
        first.items.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![d.id, c.id]
    );
    assert!(first.has_more);
    assert_eq!(first.next_cursor, Some(c.id));

    let second = queues
        .list_verifications(VerificationStatus::Pending, Some(2), first.next_cursor)
        .await
        .unwrap();
    assert_eq!(
        second.items.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![b.id, a.id]
    );
    assert!(!second.has_more);
}

#[tokio::test]
async fn listing_filters_by_exact_status() {
    let (store, queues) = setup().await;
    seed_four(&store, VerificationStatus::Pending).await;
    let rejected = verification("emp-other", VerificationStatus::Rejected, Utc::now());
    store.create_verification(&rejected).await.unwrap();

    let page = queues
        .list_verifications(VerificationStatus::Rejected, Some(10), None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, rejected.id);
    assert!(!page.has_more);
}

#[tokio::test]
async fn unknown_cursor_fails_instead_of_resetting() {
    let (store, queues) = setup().await;
    seed_four(&store, VerificationStatus::Pending).await;

    let err = queues
        .list_verifications(VerificationStatus::Pending, Some(2), Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCursor(_)));

    // A verification cursor is meaningless on the appeals queue.
    let page = queues
        .list_verifications(VerificationStatus::Pending, Some(1), None)
        .await
        .unwrap();
    let err = queues
        .list_appeals(VerificationStatus::Pending, Some(2), page.next_cursor)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCursor(_)));
}

#[tokio::test]
async fn stats_match_list_totals_across_pages() {
    let (store, queues) = setup().await;
    seed_four(&store, VerificationStatus::Pending).await;
    seed_four(&store, VerificationStatus::Approved).await;
    let rejected = verification("emp-r", VerificationStatus::Rejected, Utc::now());
    store.create_verification(&rejected).await.unwrap();

    let stats = queues.verification_stats().await.unwrap();

    for (status, expected) in [
        (VerificationStatus::Pending, stats.pending),
        (VerificationStatus::Approved, stats.approved),
        (VerificationStatus::Rejected, stats.rejected),
    ] {
        let mut total = 0i64;
        let mut cursor = None;
        loop {
            let page = queues
                .list_verifications(status, Some(3), cursor)
                .await
                .unwrap();
            total += page.items.len() as i64;
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }
        assert_eq!(total, expected, "status {}", status);
    }

    assert_eq!(stats.pending, 4);
    assert_eq!(stats.approved, 4);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
async fn appeals_queue_pages_like_verifications() {
    let (store, queues) = setup().await;
    let base = Utc::now();
    let mut ids = Vec::new();
    for i in 0..3 {
        let source = verification("emp-a", VerificationStatus::Rejected, base);
        let appeal = AppealRecord {
            id: Uuid::new_v4(),
            verification_id: source.id,
            subject_id: source.subject_id.clone(),
            subject_email: source.subject_email.clone(),
            id_document_url: source.id_document_url.clone(),
            residency_proof_url: source.residency_proof_url.clone(),
            selfie_url: source.selfie_url.clone(),
            message: format!("appeal {}", i),
            status: VerificationStatus::Pending,
            created_at: base + Duration::seconds(i),
            reviewed_at: None,
            comment: None,
        };
        store.create_appeal(&appeal).await.unwrap();
        ids.push(appeal.id);
    }

    let first = queues
        .list_appeals(VerificationStatus::Pending, Some(2), None)
        .await
        .unwrap();
    assert_eq!(
        first.items.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
    assert!(first.has_more);

    let second = queues
        .list_appeals(VerificationStatus::Pending, Some(2), first.next_cursor)
        .await
        .unwrap();
    assert_eq!(
        second.items.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![ids[0]]
    );
    assert!(!second.has_more);

    let stats = queues.appeal_stats().await.unwrap();
    assert_eq!(stats.pending, 3);
    assert_eq!(stats.approved, 0);
}

#[tokio::test]
async fn created_at_ties_break_deterministically() {
    let (store, queues) = setup().await;
    let now = Utc::now();
    for _ in 0..3 {
        let record = verification("emp-tie", VerificationStatus::Pending, now);
        store.create_verification(&record).await.unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = queues
            .list_verifications(VerificationStatus::Pending, Some(1), cursor)
            .await
            .unwrap();
        seen.extend(page.items.iter().map(|r| r.id));
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor;
    }
    // Every record shows up exactly once even with identical timestamps.
    assert_eq!(seen.len(), 3);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 3);
}
