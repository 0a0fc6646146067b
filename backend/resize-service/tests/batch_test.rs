mod common;

use bytes::Bytes;
use common::{jpeg, png, FaultyStore, Harness, RecordingLedger, PRESIGN_TTL};
use resize_service::imaging::{EncodeSpec, ImageFamily, ResizeSpec};
use resize_service::jobs::{checkpoint, JobLedger};
use resize_service::services::{BatchItem, BatchOrchestrator, ItemOutcome, ResizePipeline};
use resize_service::AppError;
use std::sync::Arc;

fn three_items_second_broken() -> Vec<BatchItem> {
    vec![
        BatchItem::new("first.jpg", jpeg(400, 300)),
        BatchItem::new("second.jpg", Bytes::from_static(b"\xff\xd8 truncated jpeg")),
        BatchItem::new("third.png", png(300, 400)),
    ]
}

#[tokio::test]
async fn test_partial_failure_is_reported_per_item() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(1);

    let result = orchestrator
        .run_batch(
            three_items_second_broken(),
            ResizeSpec::fit(100, 0),
            EncodeSpec::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.image_jobs.len(), 3);
    assert_eq!(result.failed_count(), 1);

    match &result.image_jobs[0] {
        ItemOutcome::Succeeded(item) => {
            assert_eq!(item.filename, "first.jpg");
            assert_eq!(item.format, ImageFamily::Jpeg);
            let prefix = format!("batch/{}_", result.batch_job_id);
            assert!(item.object_name.starts_with(&prefix));
            assert!(item.object_name.ends_with(".jpg"));
            assert!(item.download_url.contains(&item.object_name));
        }
        other => panic!("expected success, got {other:?}"),
    }

    match &result.image_jobs[1] {
        ItemOutcome::Failed(item) => {
            assert_eq!(item.filename, "second.jpg");
            assert!(item.error.starts_with("Resize failed:"), "{}", item.error);
        }
        other => panic!("expected failure, got {other:?}"),
    }

    match &result.image_jobs[2] {
        ItemOutcome::Succeeded(item) => {
            assert_eq!(item.filename, "third.png");
            assert_eq!(item.format, ImageFamily::Png);
            assert!(item.object_name.ends_with(".png"));
        }
        other => panic!("expected success, got {other:?}"),
    }

    assert_eq!(harness.store.len(), 2);
    assert_eq!(
        harness.ledger.get_progress(&result.batch_job_id).await.unwrap(),
        100
    );
    // failed items are still marked complete
    for outcome in &result.image_jobs {
        assert_eq!(harness.ledger.get_progress(outcome.job_id()).await.unwrap(), 100);
    }
}

#[tokio::test]
async fn test_parent_progress_tracks_processed_items() {
    let harness = Harness::new();
    let result = harness
        .orchestrator(1)
        .run_batch(
            three_items_second_broken(),
            ResizeSpec::fit(50, 0),
            EncodeSpec::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        harness.ledger.history(&result.batch_job_id),
        vec![0, 33, 66, 100, 100]
    );
}

#[tokio::test]
async fn test_child_checkpoints() {
    let harness = Harness::new();
    let result = harness
        .orchestrator(1)
        .run_batch(
            three_items_second_broken(),
            ResizeSpec::fit(50, 0),
            EncodeSpec::default(),
        )
        .await
        .unwrap();

    let ok = harness.ledger.history(result.image_jobs[0].job_id());
    assert_eq!(
        ok,
        vec![
            checkpoint::CREATED,
            checkpoint::STARTED,
            checkpoint::INPUT_RECEIVED,
            checkpoint::ENCODED,
            checkpoint::UPLOADED,
            checkpoint::COMPLETE
        ]
    );

    let failed = harness.ledger.history(result.image_jobs[1].job_id());
    assert_eq!(
        failed,
        vec![
            checkpoint::CREATED,
            checkpoint::STARTED,
            checkpoint::INPUT_RECEIVED,
            checkpoint::COMPLETE
        ]
    );
}

#[tokio::test]
async fn test_concurrent_batch_keeps_input_order_and_monotonic_progress() {
    let harness = Harness::new();
    let items: Vec<BatchItem> = (0..8)
        .map(|i| BatchItem::new(format!("img-{i}.jpg"), jpeg(80 + i * 10, 60)))
        .collect();

    let result = harness
        .orchestrator(4)
        .run_batch(items, ResizeSpec::fit(40, 0), EncodeSpec::default())
        .await
        .unwrap();

    let names: Vec<String> = result
        .image_jobs
        .iter()
        .map(|o| match o {
            ItemOutcome::Succeeded(item) => item.filename.clone(),
            ItemOutcome::Failed(item) => item.filename.clone(),
        })
        .collect();
    let expected: Vec<String> = (0..8).map(|i| format!("img-{i}.jpg")).collect();
    assert_eq!(names, expected);

    let progress = harness.ledger.history(&result.batch_job_id);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&100));
}

#[tokio::test]
async fn test_unreadable_item_reports_read_failure() {
    let harness = Harness::new();
    let items = vec![
        BatchItem::unreadable("huge.jpg", "Upload too large: huge.jpg exceeds the limit"),
        BatchItem::new("small.jpg", jpeg(20, 20)),
    ];

    let result = harness
        .orchestrator(1)
        .run_batch(items, ResizeSpec::fit(10, 0), EncodeSpec::default())
        .await
        .unwrap();

    match &result.image_jobs[0] {
        ItemOutcome::Failed(item) => {
            assert!(item.error.starts_with("Failed to read image:"), "{}", item.error)
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(result.image_jobs[1].is_success());
}

#[tokio::test]
async fn test_upload_failures_do_not_abort_batch() {
    let ledger = RecordingLedger::default();
    let store = FaultyStore {
        fail_put: true,
        ..FaultyStore::default()
    };
    let pipeline = ResizePipeline::new(Arc::new(ledger.clone()), Arc::new(store), PRESIGN_TTL);
    let orchestrator = BatchOrchestrator::new(pipeline);

    let items = vec![
        BatchItem::new("a.jpg", jpeg(30, 30)),
        BatchItem::new("b.jpg", jpeg(30, 30)),
    ];
    let result = orchestrator
        .run_batch(items, ResizeSpec::fit(10, 10), EncodeSpec::default())
        .await
        .unwrap();

    assert_eq!(result.failed_count(), 2);
    for outcome in &result.image_jobs {
        match outcome {
            ItemOutcome::Failed(item) => {
                assert!(item.error.starts_with("Failed to upload image:"), "{}", item.error)
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
    assert_eq!(ledger.get_progress(&result.batch_job_id).await.unwrap(), 100);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let harness = Harness::new();
    let err = harness
        .orchestrator(1)
        .run_batch(Vec::new(), ResizeSpec::fit(10, 0), EncodeSpec::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(harness.ledger.job_count(), 0);
}

#[tokio::test]
async fn test_zero_dimensions_rejected_before_any_job() {
    let harness = Harness::new();
    let err = harness
        .orchestrator(1)
        .run_batch(
            three_items_second_broken(),
            ResizeSpec::fit(0, 0),
            EncodeSpec::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidDimensions(_)));
    assert_eq!(harness.ledger.job_count(), 0);
}
