//! External collaborators consumed only through their interfaces. No
//! production implementation ships in this crate; `mock.rs` holds the test
//! doubles used by the integration tests.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AnalyzerError;
use crate::model::DiffEntry;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Access to a remote repository's source and history. Backed in production
/// by a forge client (GitHub, etc.) — out of scope for this crate.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Shallow-clone `repo_name` at `commit_sha` into `dest`.
    async fn shallow_clone(&self, repo_name: &str, commit_sha: &str, dest: &Path) -> Result<()>;

    /// Fetch `commit_sha` into an existing mirror at `dest` and check it out.
    async fn fetch_and_checkout(&self, repo_name: &str, commit_sha: &str, dest: &Path) -> Result<()>;

    /// Deepen a shallow clone into a full history clone, in the background.
    /// Failure here never fails the analysis job that triggered it.
    async fn deepen_clone(&self, repo_name: &str, dest: &Path) -> Result<()>;

    /// The unified diff between `from_sha` and `to_sha`.
    async fn diff(&self, repo_name: &str, from_sha: &str, to_sha: &str) -> Result<Vec<DiffEntry>>;

    /// Every tracked file under `dest`, excluding `node_modules`.
    async fn list_files(&self, dest: &Path) -> Result<Vec<String>>;
}

/// Resolves a file's static imports. Backed in production by a JS/TS parser
/// — out of scope for this crate.
#[async_trait]
pub trait ImportExtractor: Send + Sync {
    /// Import targets for `path`, resolved to in-repo paths. A file that
    /// cannot be parsed (e.g. a non-source asset) is an `ExtractorSkip`: it
    /// yields no imports and the caller continues rather than failing the
    /// job.
    async fn extract_imports(&self, repo_root: &Path, path: &str) -> Result<Vec<String>>;
}
