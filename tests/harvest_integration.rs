//! End-to-end runs of the harvester against a mock archive.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use harvester_core::{
    DiscoveryError, HarvestConfig, HarvestError, Harvester, PoolConfig, RetryPolicy,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

mod support;
use support::archive::{
    artifact_path, collection_html, collection_path, detail_html, detail_path, mount_html,
    mount_item, mount_status, root_html,
};
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn config(server: &MockServer, temp_dir: &TempDir, workers: usize) -> HarvestConfig {
    let mut config = HarvestConfig::new(Url::parse(&server.uri()).unwrap(), temp_dir.path());
    config.pool = PoolConfig::with_workers(workers);
    config.retry_policy = RetryPolicy::with_max_attempts(3);
    config.timeout_secs = 5;
    config
}

fn saved_files(temp_dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_one_failing_item_does_not_affect_the_others() {
    let server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();
    let ids = ["p1", "p2", "p3", "p4", "bad"];

    mount_html(&server, "/", root_html(&[collection_path(2023)])).await;
    mount_html(
        &server,
        &collection_path(2023),
        collection_html(&ids.map(|id| detail_path(2023, id))),
    )
    .await;
    for id in &ids[..4] {
        mount_item(&server, 2023, id, &format!("Paper {id}"), id.as_bytes()).await;
    }
    let bad_artifact = artifact_path(2023, "bad");
    mount_html(
        &server,
        &detail_path(2023, "bad"),
        detail_html("Paper bad", Some(&bad_artifact)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(bad_artifact))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let report = Harvester::new(config(&server, &temp_dir, 4))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.discovery.tasks, 5);
    assert_eq!(report.downloads.saved(), 4);
    assert_eq!(report.downloads.failed(), 1);
    assert_eq!(report.downloads.skipped(), 0);
    assert_eq!(report.downloads.retried(), 2);
    assert_eq!(
        saved_files(&temp_dir),
        vec!["Paper p1.pdf", "Paper p2.pdf", "Paper p3.pdf", "Paper p4.pdf"]
    );
    for id in &ids[..4] {
        let content = std::fs::read(temp_dir.path().join(format!("Paper {id}.pdf"))).unwrap();
        assert_eq!(content, id.as_bytes());
    }
    server.verify().await;
}

#[tokio::test]
async fn test_run_completes_when_one_collection_is_unreachable() {
    let server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    mount_html(
        &server,
        "/",
        root_html(&[collection_path(2023), collection_path(2022)]),
    )
    .await;
    mount_status(&server, &collection_path(2023), 404).await;
    mount_html(
        &server,
        &collection_path(2022),
        collection_html(&[detail_path(2022, "ok"), detail_path(2022, "nolink")]),
    )
    .await;
    mount_item(&server, 2022, "ok", "Reachable", b"pdf").await;
    mount_html(
        &server,
        &detail_path(2022, "nolink"),
        detail_html("No Artifact", None),
    )
    .await;

    let report = Harvester::new(config(&server, &temp_dir, 2))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.discovery.collections, 2);
    assert_eq!(report.discovery.collections_failed, 1);
    assert_eq!(report.downloads.saved(), 1);
    assert_eq!(report.downloads.skipped(), 1);
    assert_eq!(report.downloads.failed(), 0);
    assert_eq!(saved_files(&temp_dir), vec!["Reachable.pdf"]);
}

#[tokio::test]
async fn test_root_failure_aborts_run() {
    let server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();
    mount_status(&server, "/", 503).await;

    let result = Harvester::new(config(&server, &temp_dir, 2))
        .unwrap()
        .run()
        .await;

    assert!(
        matches!(
            result,
            Err(HarvestError::Discovery(DiscoveryError::RootPage { .. }))
        ),
        "unexpected result: {result:?}"
    );
    assert!(saved_files(&temp_dir).is_empty());
}

#[tokio::test]
async fn test_output_directory_is_created_on_demand() {
    let server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    mount_html(&server, "/", root_html(&[collection_path(2023)])).await;
    mount_html(
        &server,
        &collection_path(2023),
        collection_html(&[detail_path(2023, "a")]),
    )
    .await;
    mount_item(&server, 2023, "a", "Nested", b"bytes").await;

    let mut config = config(&server, &temp_dir, 1);
    config.output_dir = temp_dir.path().join("runs/2023");

    Harvester::new(config).unwrap().run().await.unwrap();

    assert!(temp_dir.path().join("runs/2023/Nested.pdf").exists());
}

/// Counts concurrent artifact requests; blocks briefly so requests overlap.
///
/// The blocking sleep runs on wiremock's own server thread, not the test runtime.
struct ConcurrencyTrackingResponder {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Respond for ConcurrencyTrackingResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        self.current.fetch_sub(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_bytes(b"content")
    }
}

#[tokio::test]
async fn test_worker_count_bounds_concurrent_transfers() {
    let server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();
    let ids: Vec<String> = (0..12).map(|i| format!("item{i}")).collect();

    mount_html(&server, "/", root_html(&[collection_path(2023)])).await;
    mount_html(
        &server,
        &collection_path(2023),
        collection_html(&ids.iter().map(|id| detail_path(2023, id)).collect::<Vec<_>>()),
    )
    .await;
    for id in &ids {
        mount_html(
            &server,
            &detail_path(2023, id),
            detail_html(id, Some(&artifact_path(2023, id))),
        )
        .await;
    }

    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path_regex(r"-Paper-Conference\.pdf$"))
        .respond_with(ConcurrencyTrackingResponder {
            current: Arc::clone(&current),
            peak: Arc::clone(&peak),
        })
        .mount(&server)
        .await;

    let mut config = config(&server, &temp_dir, 3);
    config.pool.queue_capacity = 1;

    let report = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.downloads.saved(), 12);
    assert_eq!(saved_files(&temp_dir).len(), 12);
    assert!(
        peak.load(Ordering::SeqCst) <= 3,
        "peak concurrency {} exceeded worker count",
        peak.load(Ordering::SeqCst)
    );
}
