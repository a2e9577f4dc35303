//! The `GraphStore` abstraction.
//!
//! Two implementations exist: [`super::neo4j::Neo4jGraphStore`], which talks
//! to Neo4j directly (used inside the graph-service binary's handlers), and
//! [`super::http_client::HttpGraphStoreClient`], which talks to that same
//! service over HTTP (used by the worker and the ingester). Callers depend
//! only on this trait.

use crate::error::GraphStoreError;
use crate::model::FileNode;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, GraphStoreError>;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Whether a `Repo` node for `repo_name` exists.
    async fn repo_exists(&self, repo_name: &str) -> Result<bool>;

    /// The commit SHA this repo was last fully/incrementally analyzed at,
    /// or `None` if it has never been analyzed.
    async fn get_last_analyzed_sha(&self, repo_name: &str) -> Result<Option<String>>;

    /// Record the commit SHA this repo now reflects. Creates the `Repo`
    /// node if it does not already exist.
    async fn set_last_analyzed_sha(&self, repo_name: &str, sha: &str) -> Result<()>;

    /// Idempotently create or confirm a `File` node for `(repo_name, path)`,
    /// setting its `name` attribute.
    async fn upsert_file(&self, repo_name: &str, path: &str, name: &str) -> Result<()>;

    /// Remove a `File` node and all `Imports` edges touching it.
    async fn delete_file(&self, repo_name: &str, path: &str) -> Result<()>;

    /// Idempotently create an `Imports` edge `from -> to` within `repo_name`.
    /// Ensures the target `File` exists (setting its `name`) and ensures the
    /// source `File` exists too, in the same operation — this is what keeps
    /// a concurrent delete of the source from producing an orphan edge.
    async fn upsert_edge(&self, repo_name: &str, from_path: &str, to_path: &str, to_name: &str) -> Result<()>;

    /// Remove every outgoing `Imports` edge from `(repo_name, path)`, leaving
    /// the `File` node itself untouched.
    async fn delete_outgoing_edges(&self, repo_name: &str, path: &str) -> Result<()>;

    /// Files that `(repo_name, path)` directly imports.
    async fn dependencies(&self, repo_name: &str, path: &str) -> Result<Vec<String>>;

    /// Files that directly import `(repo_name, path)`.
    async fn dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>>;

    /// Every file that transitively imports `(repo_name, path)`, deduplicated.
    /// Safe on cyclic graphs.
    async fn recursive_dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>>;

    /// Every `File` and `Imports` edge currently stored for `repo_name`.
    async fn full_graph(&self, repo_name: &str) -> Result<(Vec<FileNode>, Vec<(String, String)>)>;

    /// Ensure the composite `(repoName, path)` uniqueness constraint exists,
    /// migrating away from a legacy single-property `File.id` constraint if
    /// one is found.
    async fn ensure_constraints(&self) -> Result<()>;
}
