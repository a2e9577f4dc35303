//! Drives `Analyzer::run` itself (not just `process_job`) against the
//! in-memory `MockJobQueue`, exercising the publish → pop → ack → dispatch
//! path and the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use doraemon::analyzer::mock::{MockImportExtractor, MockSourceProvider};
use doraemon::analyzer::Analyzer;
use doraemon::graphstore::mock::MockGraphStore;
use doraemon::jobqueue::mock::MockJobQueue;
use doraemon::model::{AnalysisJob, DispatchStatus};
use tokio::sync::mpsc;

#[tokio::test]
async fn run_loop_processes_a_published_job_then_stops_on_shutdown() {
    let graph = Arc::new(MockGraphStore::new());
    let queue = Arc::new(MockJobQueue::new());
    let source = Arc::new(MockSourceProvider::new());
    let extractor = Arc::new(MockImportExtractor::new());

    source.seed_listing("acme/widgets", "c1", vec!["a.ts".into()]);

    queue
        .publish_analysis(&AnalysisJob {
            job_id: "1".into(),
            repo_name: "acme/widgets".into(),
            commit_sha: "c1".into(),
            event: "push".into(),
            pr_number: None,
            received_at: "2026-01-01T00:00:00Z".into(),
        })
        .await
        .unwrap();

    let analyzer = Analyzer::new(graph.clone(), queue.clone(), source, extractor, "/tmp/doraemon-worker-loop", 2);

    let (stop_tx, stop_rx) = mpsc::channel(1);
    let run_handle = tokio::spawn(async move { analyzer.run("worker-1", stop_rx).await });

    // Give the loop a turn to pop and process the one pending job before
    // telling it to stop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).await.unwrap();

    run_handle.await.unwrap().unwrap();

    let (files, _) = graph.full_graph("acme/widgets").await.unwrap();
    assert_eq!(files.iter().map(|f| f.path.clone()).collect::<Vec<_>>(), vec!["a.ts".to_string()]);
    assert_eq!(queue.acked_ids().len(), 1);

    let dispatched = queue.dispatched.lock().unwrap();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].status, DispatchStatus::Success);
}
