//! Integration tests for the atomic batch writer.

mod common;

use std::collections::HashSet;

use ingest_core::domains::events::{
    ingest_batch, write_batch, BatchError, CandidateEvent, Event, IngestError, Level,
    ValidatedBatch, ValidationError,
};
use test_context::test_context;
use tokio_util::sync::CancellationToken;

use crate::common::{numbered_candidate, valid_batch, valid_candidate, TestHarness};

#[test_context(TestHarness)]
#[tokio::test]
async fn single_member_batch(ctx: &TestHarness) {
    let receipt = ingest_batch(&[valid_candidate()], &ctx.store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(receipt.count(), 1);
    assert_eq!(ctx.count().await, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn full_batch_returns_ids_in_input_order(ctx: &TestHarness) {
    let batch = valid_batch(1000);

    let receipt = ingest_batch(&batch, &ctx.store, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(receipt.count(), 1000);
    let unique: HashSet<_> = receipt.ids.iter().collect();
    assert_eq!(unique.len(), 1000);

    for (n, id) in receipt.ids.iter().enumerate() {
        let stored = Event::find_by_id(*id, ctx.store.pool())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.message, format!("event {n}"));
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn batch_members_share_one_receipt_time(ctx: &TestHarness) {
    let receipt = ingest_batch(&valid_batch(25), &ctx.store, &CancellationToken::new())
        .await
        .unwrap();

    let stored = Event::list_by_received_at(&receipt.received_at, ctx.store.pool())
        .await
        .unwrap();
    assert_eq!(stored.len(), 25);
    assert!(stored.iter().all(|e| e.received_at == receipt.received_at));

    let stored_ids: Vec<_> = stored.iter().map(|e| e.id).collect();
    assert_eq!(stored_ids, receipt.ids);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn batch_members_are_normalized(ctx: &TestHarness) {
    let batch = vec![
        CandidateEvent::new(" a ", "2025-01-01T00:00:00Z", "error", " boom "),
        CandidateEvent::new("b", "2025-01-01T00:00:00Z", "Debug", "trace")
            .with_meta(r#"{"k":"v"}"#),
    ];

    let receipt = ingest_batch(&batch, &ctx.store, &CancellationToken::new())
        .await
        .unwrap();

    let first = Event::find_by_id(receipt.ids[0], ctx.store.pool())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.source, "a");
    assert_eq!(first.level, Level::Error);
    assert_eq!(first.message, "boom");
    assert_eq!(first.meta, None);

    let second = Event::find_by_id(receipt.ids[1], ctx.store.pool())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.level, Level::Debug);
    assert_eq!(second.meta.as_deref(), Some(r#"{"k":"v"}"#));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn one_invalid_member_aborts_whole_batch(ctx: &TestHarness) {
    for k in [0, 4, 9] {
        let mut batch = valid_batch(10);
        batch[k].source = String::new();

        let err = ingest_batch(&batch, &ctx.store, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            IngestError::Batch(BatchError::Invalid { index, reason }) => {
                assert_eq!(index, k);
                assert_eq!(reason, ValidationError::SourceRequired);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ctx.count().await, 0);
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn invalid_member_message_names_its_index(ctx: &TestHarness) {
    let mut batch = valid_batch(3);
    batch[1].level = "LOUD".to_string();

    let err = ingest_batch(&batch, &ctx.store, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "invalid_event");
    assert_eq!(
        err.to_string(),
        "index 1: level must be one of DEBUG, INFO, WARN, ERROR"
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn size_limits_are_checked_without_touching_store(ctx: &TestHarness) {
    // Any store access would fail with a storage error once closed.
    ctx.store.close().await;

    let cancel = CancellationToken::new();

    let err = ingest_batch(&[], &ctx.store, &cancel).await.unwrap_err();
    assert!(matches!(err, IngestError::Batch(BatchError::Empty)));
    assert_eq!(err.to_string(), "batch must not be empty");

    let err = ingest_batch(&valid_batch(1001), &ctx.store, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Batch(BatchError::TooLarge { len: 1001 })));
    assert_eq!(err.code(), "invalid_request");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_members_each_get_their_own_id(ctx: &TestHarness) {
    let batch = vec![valid_candidate(); 3];

    let receipt = ingest_batch(&batch, &ctx.store, &CancellationToken::new())
        .await
        .unwrap();

    let unique: HashSet<_> = receipt.ids.iter().collect();
    assert_eq!(unique.len(), 3);
    assert_eq!(ctx.count().await, 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn store_failure_mid_batch_rolls_back_everything(ctx: &TestHarness) {
    ctx.poison_message("event 7").await;

    let err = ingest_batch(&valid_batch(10), &ctx.store, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Store(_)));
    assert!(!err.is_client_fault());
    assert_eq!(ctx.count().await, 0);

    // The store is still usable afterwards.
    ingest_batch(&[numbered_candidate(1)], &ctx.store, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ctx.count().await, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cancelled_batch_stores_nothing(ctx: &TestHarness) {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ingest_batch(&valid_batch(5), &ctx.store, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Cancelled));
    assert_eq!(ctx.count().await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cancelling_a_blocked_batch_rolls_it_back(ctx: &TestHarness) {
    let lock = ctx.hold_write_lock().await;
    let cancel = CancellationToken::new();

    let write = {
        let store = ctx.store.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { ingest_batch(&valid_batch(20), &store, &cancel).await })
    };

    // The first insert is now waiting on the lock.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    cancel.cancel();

    let err = write.await.unwrap().unwrap_err();
    assert!(matches!(err, IngestError::Cancelled));

    ctx.release_write_lock(lock).await;
    assert_eq!(ctx.count().await, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn batch_dropped_mid_transaction_is_rolled_back(ctx: &TestHarness) {
    let batch = ValidatedBatch::validate(&valid_batch(500)).unwrap();

    // Give the write no time at all; whatever it staged must disappear.
    let outcome = tokio::time::timeout(
        std::time::Duration::from_nanos(1),
        write_batch(&batch, &ctx.store),
    )
    .await;

    let count = ctx.count().await;
    match outcome {
        Ok(Ok(receipt)) => assert_eq!(count, receipt.count() as i64),
        _ => assert_eq!(count, 0),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn consecutive_batches_sort_after_each_other(ctx: &TestHarness) {
    let cancel = CancellationToken::new();
    let first = ingest_batch(&valid_batch(5), &ctx.store, &cancel).await.unwrap();
    let second = ingest_batch(&valid_batch(5), &ctx.store, &cancel).await.unwrap();

    let last_of_first = first.ids.last().unwrap().to_string();
    let first_of_second = second.ids.first().unwrap().to_string();
    assert!(last_of_first < first_of_second);
}
