//! Neo4j-backed `GraphStore`: `Graph::new` construction, a `query(..).param(..)`
//! builder idiom, and `MERGE`-then-`SET` upserts throughout. The variable-length
//! reverse-`IMPORTS` traversal in `recursive_dependents` follows the same
//! `MATCH ... <-[:REL*1..N]-(dependent)` / `RETURN DISTINCT` shape as a
//! depth-bounded dependent-file lookup.

use async_trait::async_trait;
use neo4rs::{query, Graph};

use crate::error::GraphStoreError;
use crate::graphstore::traits::{GraphStore, Result};
use crate::model::FileNode;

/// The single-property constraint the original schema used, before File
/// identity became the composite `(repoName, path)` key.
const LEGACY_FILE_CONSTRAINT: &str = "file_id_unique";

pub struct Neo4jGraphStore {
    graph: Graph,
    traversal_depth_cap: u32,
}

impl Neo4jGraphStore {
    pub async fn connect(uri: &str, user: &str, password: &str, traversal_depth_cap: u32) -> anyhow::Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        let store = Self {
            graph,
            traversal_depth_cap,
        };
        store
            .ensure_constraints()
            .await
            .map_err(|e| anyhow::anyhow!("schema init failed: {e}"))?;
        Ok(store)
    }

    fn unavailable(e: neo4rs::Error) -> GraphStoreError {
        GraphStoreError::Unavailable(e.to_string())
    }

    fn query_err(e: neo4rs::Error) -> GraphStoreError {
        GraphStoreError::Query(e.to_string())
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn repo_exists(&self, repo_name: &str) -> Result<bool> {
        let q = query("MATCH (r:Repo {name: $name}) RETURN r LIMIT 1").param("name", repo_name);
        let mut result = self.graph.execute(q).await.map_err(Self::unavailable)?;
        Ok(result.next().await.map_err(Self::query_err)?.is_some())
    }

    async fn get_last_analyzed_sha(&self, repo_name: &str) -> Result<Option<String>> {
        let q = query("MATCH (r:Repo {name: $name}) RETURN r.last_analyzed_sha AS sha")
            .param("name", repo_name);
        let mut result = self.graph.execute(q).await.map_err(Self::unavailable)?;
        if let Some(row) = result.next().await.map_err(Self::query_err)? {
            Ok(row.get::<String>("sha").ok())
        } else {
            Ok(None)
        }
    }

    async fn set_last_analyzed_sha(&self, repo_name: &str, sha: &str) -> Result<()> {
        let q = query(
            r#"
            MERGE (r:Repo {name: $name})
            SET r.last_analyzed_sha = $sha
            "#,
        )
        .param("name", repo_name)
        .param("sha", sha);

        self.graph.run(q).await.map_err(Self::unavailable)?;
        Ok(())
    }

    async fn upsert_file(&self, repo_name: &str, path: &str, name: &str) -> Result<()> {
        let q = query(
            r#"
            MERGE (r:Repo {name: $repo})
            MERGE (f:File {repo: $repo, path: $path})
            SET f.name = $name
            MERGE (r)-[:HAS_FILE]->(f)
            "#,
        )
        .param("repo", repo_name)
        .param("path", path)
        .param("name", name);

        self.graph.run(q).await.map_err(Self::unavailable)?;
        Ok(())
    }

    async fn delete_file(&self, repo_name: &str, path: &str) -> Result<()> {
        let q = query(
            r#"
            MATCH (f:File {repo: $repo, path: $path})
            DETACH DELETE f
            "#,
        )
        .param("repo", repo_name)
        .param("path", path);

        self.graph.run(q).await.map_err(Self::unavailable)?;
        Ok(())
    }

    async fn upsert_edge(&self, repo_name: &str, from_path: &str, to_path: &str, to_name: &str) -> Result<()> {
        // Both endpoints are MERGEd in the same query: a MATCH here would let a
        // concurrent delete of either File silently drop the edge instead of
        // recreating the node it touches.
        let q = query(
            r#"
            MERGE (r:Repo {name: $repo})
            MERGE (from:File {repo: $repo, path: $from_path})
            MERGE (to:File {repo: $repo, path: $to_path})
            ON CREATE SET to.name = $to_name
            MERGE (r)-[:HAS_FILE]->(from)
            MERGE (r)-[:HAS_FILE]->(to)
            MERGE (from)-[:IMPORTS]->(to)
            "#,
        )
        .param("repo", repo_name)
        .param("from_path", from_path)
        .param("to_path", to_path)
        .param("to_name", to_name);

        self.graph.run(q).await.map_err(Self::unavailable)?;
        Ok(())
    }

    async fn delete_outgoing_edges(&self, repo_name: &str, path: &str) -> Result<()> {
        let q = query(
            r#"
            MATCH (f:File {repo: $repo, path: $path})-[e:IMPORTS]->()
            DELETE e
            "#,
        )
        .param("repo", repo_name)
        .param("path", path);

        self.graph.run(q).await.map_err(Self::unavailable)?;
        Ok(())
    }

    async fn dependencies(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let q = query(
            r#"
            MATCH (f:File {repo: $repo, path: $path})-[:IMPORTS]->(dep:File)
            RETURN dep.path AS path
            "#,
        )
        .param("repo", repo_name)
        .param("path", path);

        let mut result = self.graph.execute(q).await.map_err(Self::unavailable)?;
        let mut paths = Vec::new();
        while let Some(row) = result.next().await.map_err(Self::query_err)? {
            paths.push(row.get("path").map_err(Self::query_err)?);
        }
        Ok(paths)
    }

    async fn dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let q = query(
            r#"
            MATCH (f:File {repo: $repo, path: $path})<-[:IMPORTS]-(dependent:File)
            RETURN dependent.path AS path
            "#,
        )
        .param("repo", repo_name)
        .param("path", path);

        let mut result = self.graph.execute(q).await.map_err(Self::unavailable)?;
        let mut paths = Vec::new();
        while let Some(row) = result.next().await.map_err(Self::query_err)? {
            paths.push(row.get("path").map_err(Self::query_err)?);
        }
        Ok(paths)
    }

    async fn recursive_dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        // Variable-length reverse traversal, `DISTINCT` handles cycles server-side.
        let q = query(&format!(
            r#"
            MATCH (f:File {{repo: $repo, path: $path}})<-[:IMPORTS*1..{}]-(dependent:File)
            WHERE dependent <> f
            RETURN DISTINCT dependent.path AS path
            "#,
            self.traversal_depth_cap
        ))
        .param("repo", repo_name)
        .param("path", path);

        let mut result = self.graph.execute(q).await.map_err(Self::unavailable)?;
        let mut paths = Vec::new();
        while let Some(row) = result.next().await.map_err(Self::query_err)? {
            paths.push(row.get("path").map_err(Self::query_err)?);
        }
        Ok(paths)
    }

    async fn full_graph(&self, repo_name: &str) -> Result<(Vec<FileNode>, Vec<(String, String)>)> {
        let files_q = query("MATCH (f:File {repo: $repo}) RETURN f.path AS path, f.name AS name")
            .param("repo", repo_name);
        let mut files_result = self.graph.execute(files_q).await.map_err(Self::unavailable)?;
        let mut files = Vec::new();
        while let Some(row) = files_result.next().await.map_err(Self::query_err)? {
            let path: String = row.get("path").map_err(Self::query_err)?;
            let name: String = row.get("name").map_err(Self::query_err)?;
            files.push(FileNode { path, name });
        }

        let edges_q = query(
            r#"
            MATCH (from:File {repo: $repo})-[:IMPORTS]->(to:File {repo: $repo})
            RETURN from.path AS from_path, to.path AS to_path
            "#,
        )
        .param("repo", repo_name);
        let mut edges_result = self.graph.execute(edges_q).await.map_err(Self::unavailable)?;
        let mut edges = Vec::new();
        while let Some(row) = edges_result.next().await.map_err(Self::query_err)? {
            let from_path: String = row.get("from_path").map_err(Self::query_err)?;
            let to_path: String = row.get("to_path").map_err(Self::query_err)?;
            edges.push((from_path, to_path));
        }

        Ok((files, edges))
    }

    async fn ensure_constraints(&self) -> Result<()> {
        // Migrate away from the legacy single-property `File.id` constraint,
        // if still present, before creating the composite one.
        let show_q = query("SHOW CONSTRAINTS YIELD name, labelsOrTypes, properties");
        let mut result = self.graph.execute(show_q).await.map_err(Self::unavailable)?;
        while let Some(row) = result.next().await.map_err(Self::query_err)? {
            let name: String = row.get("name").unwrap_or_default();
            if name == LEGACY_FILE_CONSTRAINT {
                tracing::info!("dropping legacy constraint {}", name);
                let drop_q = query(&format!("DROP CONSTRAINT {} IF EXISTS", name));
                self.graph.run(drop_q).await.map_err(Self::unavailable)?;
            }
        }

        let composite = query(
            "CREATE CONSTRAINT file_repo_path IF NOT EXISTS \
             FOR (f:File) REQUIRE (f.repo, f.path) IS UNIQUE",
        );
        self.graph.run(composite).await.map_err(Self::unavailable)?;

        let repo_name = query("CREATE CONSTRAINT repo_name IF NOT EXISTS FOR (r:Repo) REQUIRE r.name IS UNIQUE");
        self.graph.run(repo_name).await.map_err(Self::unavailable)?;

        Ok(())
    }
}
