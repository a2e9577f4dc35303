//! Error taxonomy shared by the graph store, the job queue, and the analyzer.

use thiserror::Error;

/// Errors surfaced by a `GraphStore` implementation.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
    #[error("graph store query failed: {0}")]
    Query(String),
}

/// Errors surfaced by a `JobQueue` implementation.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("queue operation failed: {0}")]
    Operation(String),
}

/// Error taxonomy for one analysis job.
///
/// `ExtractorSkip` and `PartialBlastRadius` are not represented here: they
/// are handled inline where they occur (logged, contribute nothing, never
/// escalate) rather than propagated as a distinct error type.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid input: {0}")]
    InputInvalid(String),
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<GraphStoreError> for AnalyzerError {
    fn from(e: GraphStoreError) -> Self {
        match e {
            GraphStoreError::Unavailable(msg) => AnalyzerError::StoreUnavailable(msg),
            GraphStoreError::Query(msg) => AnalyzerError::StoreUnavailable(msg),
        }
    }
}
