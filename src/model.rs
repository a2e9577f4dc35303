//! Core data model shared by every component.

use serde::{Deserialize, Serialize};

/// A tracked repository, identified by its `owner/name` composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub last_analyzed_sha: Option<String>,
}

/// A source file, identified by `(repo_name, path)`. `name` is the basename,
/// redundantly stored for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub repo_name: String,
    pub path: String,
    pub name: String,
}

impl File {
    pub fn new(repo_name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = basename(&path).to_string();
        Self {
            repo_name: repo_name.into(),
            path,
            name,
        }
    }
}

/// A `File` node as returned by `GraphStore::full_graph`: just the two
/// attributes a graph read needs, without the repo key (already scoped by
/// the call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
}

/// The basename of a repository-relative path: the `name` attribute of §3.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A directed `Imports` edge: `from` imports `to`. Both endpoints belong to
/// the same repo — cross-repo imports are not represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub repo_name: String,
    pub from_path: String,
    pub to_path: String,
}

/// The unit of work published to the analysis stream: "analyze this commit".
/// `repo_name` is already canonicalized (`owner/name`, derived from the
/// trigger's `repoUrl` by the Ingester); `event` and `pr_number` are carried
/// through from the trigger payload for downstream consumers even though the
/// core's own analysis logic never reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub job_id: String,
    pub repo_name: String,
    pub commit_sha: String,
    pub event: String,
    pub pr_number: Option<i64>,
    pub received_at: String,
}

/// The result of one analysis run, published to the dispatch stream.
/// Field names match the dispatch wire schema (`repoName`, `sha`,
/// `affectedFiles`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub job_id: String,
    #[serde(rename = "repoName")]
    pub repo_name: String,
    #[serde(rename = "sha")]
    pub commit_sha: String,
    pub status: DispatchStatus,
    /// Sorted, deduplicated set of file paths in the blast radius.
    #[serde(rename = "affectedFiles")]
    pub blast_radius: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchStatus {
    Success,
    NoChange,
    Failure,
}

/// A single line of a unified diff between two commits, as reported by a
/// `SourceProvider`. `status` follows git's rename-pct-suppressed letter codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    pub path: String,
    /// Present only when `status` is `Renamed`: the file's old path.
    pub old_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}
