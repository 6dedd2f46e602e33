//! Integration tests for the scan engine facade.
//!
//! These tests verify request handling through the job queue:
//! - Submission lifecycle (not started, running, stopped)
//! - The per-request timeout and cancellation of abandoned scans
//! - Metrics and health reporting

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use shieldscan::check::{CheckStatus, ScanRequest};
use shieldscan::config::EnginePolicy;
use shieldscan::engine::{CompatibilityBaselines, EngineError, HealthStatus, ScanEngine};
use shieldscan::queue::QueueError;

use common::{test_policy, Behavior, MockBackend};

fn three_checks() -> MockBackend {
    MockBackend::new().with_service(
        "s3",
        &[
            ("s3_c1", Behavior::Pass(5)),
            ("s3_c2", Behavior::Pass(5)),
            ("s3_c3", Behavior::Fail),
        ],
    )
}

#[tokio::test]
async fn test_submit_runs_scan() {
    let engine = ScanEngine::new(test_policy(), three_checks());
    engine.start();

    let results = engine.submit(ScanRequest::new("aws")).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().filter(|r| r.status == CheckStatus::Pass).count(),
        2
    );

    let snapshot = engine.metrics_snapshot();
    assert_eq!(snapshot.total_checks_executed, 3);
    assert_eq!(snapshot.failed_checks, 1);
    assert_eq!(snapshot.active_workers, 0);
    assert_eq!(engine.queue_depth(), 0);
    assert!(engine.executing_services().is_empty());

    engine.stop().await;
}

#[tokio::test]
async fn test_submit_requires_started_engine() {
    let engine = ScanEngine::new(test_policy(), three_checks());

    let err = engine.submit(ScanRequest::new("aws")).await.unwrap_err();
    assert_eq!(err, EngineError::Queue(QueueError::NotRunning));

    engine.start();
    engine.stop().await;
    let err = engine.submit(ScanRequest::new("aws")).await.unwrap_err();
    assert_eq!(err, EngineError::Queue(QueueError::NotRunning));
}

#[tokio::test]
async fn test_request_timeout_cancels_scan() {
    let backend = MockBackend::new().with_service("ec2", &[("ec2_hang", Behavior::Hang)]);
    let stats = backend.stats();
    let policy = EnginePolicy {
        request_timeout: Duration::from_millis(150),
        ..test_policy()
    };
    let engine = ScanEngine::new(policy, backend);
    engine.start();

    let err = engine.submit(ScanRequest::new("aws")).await.unwrap_err();
    assert_eq!(err, EngineError::RequestTimeout(Duration::from_millis(150)));

    tokio::time::timeout(Duration::from_secs(2), async {
        while stats.cancelled.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("abandoned scan should cancel its checks");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.metrics_snapshot().active_workers, 0);

    engine.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_share_metrics() {
    let engine = Arc::new(ScanEngine::new(test_policy(), three_checks()));
    engine.start();

    let requests: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.submit(ScanRequest::new("aws")).await })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap().unwrap().len(), 3);
    }

    let snapshot = engine.metrics_snapshot();
    assert_eq!(snapshot.total_checks_executed, 12);
    assert_eq!(snapshot.failed_checks, 4);
    engine.stop().await;
}

#[tokio::test]
async fn test_health_reflects_baselines() {
    let engine = ScanEngine::new(test_policy(), three_checks());
    let health = engine.health().await;
    assert_eq!(health.status, HealthStatus::Ok);
    assert_eq!(health.queue_size, 0);
    assert_eq!(health.compatibility.catalog_version, "unknown");

    // The mock backend exposes no catalog listing, so any baseline fails.
    let degraded = ScanEngine::new(test_policy(), three_checks()).with_baselines(
        CompatibilityBaselines {
            expected_checks: 1,
            expected_mappings: 0,
        },
    );
    let health = degraded.health().await;
    assert_eq!(health.status, HealthStatus::Degraded);
    assert_eq!(health.compatibility.warnings.len(), 1);
}

#[tokio::test]
async fn test_policy_is_validated() {
    let policy = EnginePolicy {
        max_workers: 0,
        batch_size: 0,
        queue_workers: 0,
        ..test_policy()
    };
    let engine = ScanEngine::new(policy, three_checks());
    assert_eq!(engine.policy().max_workers, 1);
    assert_eq!(engine.policy().batch_size, 1);
    assert_eq!(engine.policy().queue_workers, 1);

    engine.start();
    let results = engine.submit(ScanRequest::new("aws")).await.unwrap();
    assert_eq!(results.len(), 3);
    engine.stop().await;
}
