//! The Analyzer. Reconciles the stored graph with a remote commit (full
//! analysis or incremental update), then computes the blast radius. The
//! worker's run loop is `tokio::select!`-driven: a long-lived loop with a
//! stop signal.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::analyzer::state::AnalyzerState;
use crate::analyzer::traits::{ImportExtractor, SourceProvider};
use crate::error::AnalyzerError;
use crate::graphstore::GraphStore;
use crate::jobqueue::JobQueue;
use crate::model::{basename, AnalysisJob, DiffEntry, DiffStatus, DispatchResult, DispatchStatus};

/// Directories never enumerated or upserted.
const EXCLUDED_DIR: &str = "node_modules";

type AnalyzerResult<T> = Result<T, AnalyzerError>;

pub struct Analyzer {
    graph: Arc<dyn GraphStore>,
    queue: Arc<dyn JobQueue>,
    source: Arc<dyn SourceProvider>,
    extractor: Arc<dyn ImportExtractor>,
    mirror_base_dir: PathBuf,
    upsert_concurrency: usize,
}

impl Analyzer {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        queue: Arc<dyn JobQueue>,
        source: Arc<dyn SourceProvider>,
        extractor: Arc<dyn ImportExtractor>,
        mirror_base_dir: impl Into<PathBuf>,
        upsert_concurrency: usize,
    ) -> Self {
        Self {
            graph,
            queue,
            source,
            extractor,
            mirror_base_dir: mirror_base_dir.into(),
            upsert_concurrency,
        }
    }

    fn mirror_dir(&self, repo_name: &str) -> PathBuf {
        self.mirror_base_dir.join(repo_name.replace('/', "__"))
    }

    /// Runs the worker loop: pull a job, process it, ack after the dispatch
    /// publish succeeds, repeat until `shutdown` resolves. Mirrors the
    /// `tokio::select! { stop_rx.recv() => break, event_rx.recv() => {...} }`
    /// shape of `FileWatcher::start`.
    pub async fn run(&self, consumer_name: &str, mut shutdown: tokio::sync::mpsc::Receiver<()>) -> AnalyzerResult<()> {
        self.queue
            .ensure_group()
            .await
            .map_err(|e| AnalyzerError::Fatal(e.to_string()))?;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("analyzer worker shutting down");
                    break;
                }
                delivery = self.queue.next_job(consumer_name, 5_000) => {
                    let Some(delivery) = delivery.map_err(|e| AnalyzerError::Fatal(e.to_string()))? else {
                        continue;
                    };

                    let result = self.process_job(&delivery.job).await;
                    if let Err(e) = self.queue.publish_dispatch(&result).await {
                        tracing::error!("failed to publish dispatch result: {}", e);
                        continue; // do not ack: crash/retry recovers via at-least-once redelivery
                    }
                    if let Err(e) = self.queue.ack(&delivery.delivery_id).await {
                        tracing::error!("failed to ack {}: {}", delivery.delivery_id, e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one job end to end, never returning `Err`: every failure
    /// mode becomes a `DispatchResult` with `status: Failure` so the caller
    /// can always publish-then-ack.
    pub async fn process_job(&self, job: &AnalysisJob) -> DispatchResult {
        let mut state = AnalyzerState::Received;
        tracing::debug!(job_id = %job.job_id, ?state, "job received");

        state = AnalyzerState::Parsing;
        if job.repo_name.trim().is_empty() || job.commit_sha.trim().is_empty() {
            return self.fail(job, AnalyzerError::InputInvalid("repo_name/commit_sha required".into()));
        }

        state = AnalyzerState::Comparing;
        tracing::debug!(job_id = %job.job_id, ?state, "comparing against stored graph");
        let last_sha = match self.graph.get_last_analyzed_sha(&job.repo_name).await {
            Ok(sha) => sha,
            Err(e) => return self.fail(job, e.into()),
        };

        let changed_files = match last_sha {
            None => {
                state = AnalyzerState::FullAnalysis;
                tracing::info!(job_id = %job.job_id, repo = %job.repo_name, "no baseline, running full analysis");
                match self.full_analysis(job).await {
                    Ok(files) => files,
                    Err(e) => return self.fail(job, e),
                }
            }
            Some(sha) if sha == job.commit_sha => {
                state = AnalyzerState::NoChange;
                tracing::info!(job_id = %job.job_id, repo = %job.repo_name, "already at {}", sha);
                return self.publish(job, DispatchStatus::NoChange, Vec::new(), state);
            }
            Some(sha) => {
                state = AnalyzerState::Incremental;
                tracing::info!(job_id = %job.job_id, repo = %job.repo_name, "incremental update {}..{}", sha, job.commit_sha);
                match self.incremental_update(job, &sha).await {
                    Ok(files) => files,
                    Err(e) => return self.fail(job, e),
                }
            }
        };

        state = AnalyzerState::Committing;
        if let Err(e) = self.graph.set_last_analyzed_sha(&job.repo_name, &job.commit_sha).await {
            return self.fail(job, e.into());
        }

        state = AnalyzerState::Publishing;
        let blast_radius = self.compute_blast_radius(&job.repo_name, &changed_files).await;
        self.publish(job, DispatchStatus::Success, blast_radius, state)
    }

    /// Builds the graph from scratch (no baseline to diff against) and
    /// upserts every listed file, but returns an empty directly-changed set:
    /// with no prior commit, there is nothing to call "changed", so the
    /// blast radius of a first analysis is empty.
    async fn full_analysis(&self, job: &AnalysisJob) -> AnalyzerResult<Vec<String>> {
        let dest = self.mirror_dir(&job.repo_name);
        self.source.shallow_clone(&job.repo_name, &job.commit_sha, &dest).await?;

        let files: Vec<String> = self
            .source
            .list_files(&dest)
            .await?
            .into_iter()
            .filter(|p| !is_excluded(p))
            .collect();

        self.upsert_files_and_edges(&job.repo_name, &dest, &files).await?;

        // Fire-and-forget: a deepen-clone failure must never fail the job.
        let source = self.source.clone();
        let repo_name = job.repo_name.clone();
        let dest_clone = dest.clone();
        tokio::spawn(async move {
            if let Err(e) = source.deepen_clone(&repo_name, &dest_clone).await {
                tracing::warn!(repo = %repo_name, "background deepen-clone failed: {}", e);
            }
        });

        Ok(Vec::new())
    }

    async fn incremental_update(&self, job: &AnalysisJob, last_sha: &str) -> AnalyzerResult<Vec<String>> {
        let dest = self.mirror_dir(&job.repo_name);
        self.source
            .fetch_and_checkout(&job.repo_name, &job.commit_sha, &dest)
            .await?;

        let diff = self.source.diff(&job.repo_name, last_sha, &job.commit_sha).await?;
        let (deletions, mutations) = resolve_diff(diff);

        // Deletion pass strictly precedes the mutation pass.
        for path in &deletions {
            self.graph.delete_file(&job.repo_name, path).await.map_err(AnalyzerError::from)?;
        }

        self.upsert_files_and_edges(&job.repo_name, &dest, &mutations).await?;

        let mut changed = deletions;
        changed.extend(mutations);
        Ok(changed)
    }

    async fn upsert_files_and_edges(&self, repo_name: &str, repo_root: &Path, files: &[String]) -> AnalyzerResult<()> {
        let concurrency = self.upsert_concurrency;
        let results: Vec<AnalyzerResult<()>> = stream::iter(files.iter().cloned())
            .map(|path| {
                let repo_name = repo_name.to_string();
                let repo_root = repo_root.to_path_buf();
                async move {
                    self.graph
                        .upsert_file(&repo_name, &path, basename(&path))
                        .await
                        .map_err(AnalyzerError::from)?;
                    self.graph.delete_outgoing_edges(&repo_name, &path).await.map_err(AnalyzerError::from)?;

                    // ExtractorSkip is not a distinct error: an unparseable file simply
                    // yields no imports here and the pipeline continues.
                    let imports = self.extractor.extract_imports(&repo_root, &path).await?;
                    for target in imports {
                        self.graph
                            .upsert_edge(&repo_name, &path, &target, basename(&target))
                            .await
                            .map_err(AnalyzerError::from)?;
                    }
                    Ok(())
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for r in results {
            r?;
        }
        Ok(())
    }

    /// Blast radius = directly-changed files ∪ union of `RecursiveDependents`
    /// per changed file. Queries run concurrently; a failed query
    /// contributes nothing and is logged, the overall result still succeeds
    /// (`PartialBlastRadius`).
    async fn compute_blast_radius(&self, repo_name: &str, changed_files: &[String]) -> Vec<String> {
        let dependents: Vec<Vec<String>> = stream::iter(changed_files.iter().cloned())
            .map(|path| {
                let repo_name = repo_name.to_string();
                async move {
                    match self.graph.recursive_dependents(&repo_name, &path).await {
                        Ok(paths) => paths,
                        Err(e) => {
                            tracing::warn!(path = %path, "recursive_dependents failed: {}", e);
                            Vec::new()
                        }
                    }
                }
            })
            .buffer_unordered(self.upsert_concurrency)
            .collect()
            .await;

        let mut radius: BTreeSet<String> = changed_files.iter().cloned().collect();
        for deps in dependents {
            radius.extend(deps);
        }
        radius.into_iter().collect()
    }

    fn fail(&self, job: &AnalysisJob, err: AnalyzerError) -> DispatchResult {
        tracing::error!(job_id = %job.job_id, repo = %job.repo_name, "analysis failed: {}", err);
        DispatchResult {
            job_id: job.job_id.clone(),
            repo_name: job.repo_name.clone(),
            commit_sha: job.commit_sha.clone(),
            status: DispatchStatus::Failure,
            blast_radius: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    fn publish(
        &self,
        job: &AnalysisJob,
        status: DispatchStatus,
        blast_radius: Vec<String>,
        state: AnalyzerState,
    ) -> DispatchResult {
        tracing::info!(job_id = %job.job_id, ?state, ?status, "job complete");
        DispatchResult {
            job_id: job.job_id.clone(),
            repo_name: job.repo_name.clone(),
            commit_sha: job.commit_sha.clone(),
            status,
            blast_radius,
            error: None,
        }
    }
}

fn is_excluded(path: &str) -> bool {
    path.split('/').any(|segment| segment == EXCLUDED_DIR)
}

/// Splits a diff into the deletion pass (paths to remove) and the mutation
/// pass (paths to upsert), applying the R/C status mapping: `Renamed` maps
/// to delete-old + add-new when a new path is available, else falls back to
/// a plain modify of the old path; `Copied` maps to a plain modify.
fn resolve_diff(diff: Vec<DiffEntry>) -> (Vec<String>, Vec<String>) {
    let mut deletions = Vec::new();
    let mut mutations = Vec::new();

    for entry in diff {
        match entry.status {
            DiffStatus::Deleted => deletions.push(entry.path),
            DiffStatus::Added | DiffStatus::Modified => mutations.push(entry.path),
            DiffStatus::Copied => mutations.push(entry.path),
            DiffStatus::Renamed => {
                if let Some(old_path) = entry.old_path {
                    deletions.push(old_path);
                    mutations.push(entry.path);
                } else {
                    mutations.push(entry.path);
                }
            }
        }
    }

    (deletions, mutations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::mock::{MockImportExtractor, MockSourceProvider};
    use crate::graphstore::mock::MockGraphStore;
    use crate::jobqueue::mock::MockJobQueue;

    fn analyzer_with(
        graph: Arc<MockGraphStore>,
        queue: Arc<MockJobQueue>,
        source: Arc<MockSourceProvider>,
        extractor: Arc<MockImportExtractor>,
    ) -> Analyzer {
        Analyzer::new(graph, queue, source, extractor, "/tmp/doraemon-test-mirrors", 4)
    }

    #[tokio::test]
    async fn full_analysis_upserts_every_listed_file() {
        let graph = Arc::new(MockGraphStore::new());
        let queue = Arc::new(MockJobQueue::new());
        let source = Arc::new(MockSourceProvider::new());
        let extractor = Arc::new(MockImportExtractor::new());

        source.seed_listing("acme/widgets", "c1", vec!["a.ts".into(), "node_modules/x.ts".into()]);

        let analyzer = analyzer_with(graph.clone(), queue, source, extractor);
        let job = AnalysisJob {
            job_id: "1".into(),
            repo_name: "acme/widgets".into(),
            commit_sha: "c1".into(),
            event: "push".into(),
            pr_number: None,
            received_at: "2026-01-01T00:00:00Z".into(),
        };

        let result = analyzer.process_job(&job).await;
        assert_eq!(result.status, DispatchStatus::Success);

        let (files, _) = graph.full_graph("acme/widgets").await.unwrap();
        assert!(files.iter().any(|f| f.path == "a.ts"));
        assert!(!files.iter().any(|f| f.path.contains("node_modules")));
    }

    #[tokio::test]
    async fn no_change_job_is_a_noop() {
        let graph = Arc::new(MockGraphStore::new());
        graph.set_last_analyzed_sha("acme/widgets", "c1").await.unwrap();
        let queue = Arc::new(MockJobQueue::new());
        let source = Arc::new(MockSourceProvider::new());
        let extractor = Arc::new(MockImportExtractor::new());

        let analyzer = analyzer_with(graph, queue, source, extractor);
        let job = AnalysisJob {
            job_id: "1".into(),
            repo_name: "acme/widgets".into(),
            commit_sha: "c1".into(),
            event: "push".into(),
            pr_number: None,
            received_at: "2026-01-01T00:00:00Z".into(),
        };

        let result = analyzer.process_job(&job).await;
        assert_eq!(result.status, DispatchStatus::NoChange);
        assert!(result.blast_radius.is_empty());
    }

    #[tokio::test]
    async fn blast_radius_includes_transitive_dependents() {
        let graph = Arc::new(MockGraphStore::new());
        graph.upsert_file("acme/widgets", "a.ts", "a.ts").await.unwrap();
        graph.upsert_file("acme/widgets", "b.ts", "b.ts").await.unwrap();
        graph.upsert_file("acme/widgets", "c.ts", "c.ts").await.unwrap();
        // c imports b, b imports a: changing a blasts through b and c.
        graph.upsert_edge("acme/widgets", "c.ts", "b.ts", "b.ts").await.unwrap();
        graph.upsert_edge("acme/widgets", "b.ts", "a.ts", "a.ts").await.unwrap();
        graph.set_last_analyzed_sha("acme/widgets", "c0").await.unwrap();

        let queue = Arc::new(MockJobQueue::new());
        let source = Arc::new(MockSourceProvider::new());
        source.seed_diff(
            "acme/widgets",
            "c0",
            "c1",
            vec![DiffEntry {
                status: DiffStatus::Modified,
                path: "a.ts".into(),
                old_path: None,
            }],
        );
        let extractor = Arc::new(MockImportExtractor::new());

        let analyzer = analyzer_with(graph, queue, source, extractor);
        let job = AnalysisJob {
            job_id: "1".into(),
            repo_name: "acme/widgets".into(),
            commit_sha: "c1".into(),
            event: "push".into(),
            pr_number: None,
            received_at: "2026-01-01T00:00:00Z".into(),
        };

        let result = analyzer.process_job(&job).await;
        assert_eq!(result.status, DispatchStatus::Success);
        let mut radius = result.blast_radius.clone();
        radius.sort();
        assert_eq!(radius, vec!["a.ts".to_string(), "b.ts".to_string(), "c.ts".to_string()]);
    }

    #[test]
    fn resolve_diff_maps_rename_to_delete_and_add() {
        let diff = vec![DiffEntry {
            status: DiffStatus::Renamed,
            path: "new.ts".into(),
            old_path: Some("old.ts".into()),
        }];
        let (deletions, mutations) = resolve_diff(diff);
        assert_eq!(deletions, vec!["old.ts".to_string()]);
        assert_eq!(mutations, vec!["new.ts".to_string()]);
    }

    #[test]
    fn resolve_diff_falls_back_to_modify_when_rename_has_no_new_path() {
        let diff = vec![DiffEntry {
            status: DiffStatus::Renamed,
            path: "old.ts".into(),
            old_path: None,
        }];
        let (deletions, mutations) = resolve_diff(diff);
        assert!(deletions.is_empty());
        assert_eq!(mutations, vec!["old.ts".to_string()]);
    }

    #[test]
    fn resolve_diff_maps_copy_to_modify() {
        let diff = vec![DiffEntry {
            status: DiffStatus::Copied,
            path: "copy.ts".into(),
            old_path: Some("source.ts".into()),
        }];
        let (deletions, mutations) = resolve_diff(diff);
        assert!(deletions.is_empty());
        assert_eq!(mutations, vec!["copy.ts".to_string()]);
    }
}
