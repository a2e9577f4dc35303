//! HTTP client for the GraphStore service, used by the worker and the
//! ingester instead of talking to Neo4j directly. A thin `reqwest`-based
//! `GraphStore` implementation over the service's REST surface.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::GraphStoreError;
use crate::graphstore::traits::{GraphStore, Result};
use crate::model::FileNode;

pub struct HttpGraphStoreClient {
    base_url: String,
    client: Client,
}

impl HttpGraphStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn transport_err(e: reqwest::Error) -> GraphStoreError {
        GraphStoreError::Unavailable(e.to_string())
    }

    async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T> {
        if !resp.status().is_success() {
            return Err(GraphStoreError::Query(format!(
                "graph service returned {}",
                resp.status()
            )));
        }
        resp.json::<T>().await.map_err(Self::transport_err)
    }
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Deserialize)]
struct ShaResponse {
    sha: Option<String>,
}

#[derive(Deserialize)]
struct PathsResponse {
    paths: Vec<String>,
}

#[derive(Deserialize)]
struct GraphNode {
    id: String,
    label: String,
}

#[derive(Deserialize)]
struct GraphEdge {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct FullGraphResponse {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

#[async_trait]
impl GraphStore for HttpGraphStoreClient {
    async fn repo_exists(&self, repo_name: &str) -> Result<bool> {
        let resp = self
            .client
            .get(self.url(&format!("/repos/{repo_name}")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let body: ExistsResponse = Self::decode(resp).await?;
        Ok(body.exists)
    }

    async fn get_last_analyzed_sha(&self, repo_name: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(self.url(&format!("/repos/{repo_name}/sha")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        let body: ShaResponse = Self::decode(resp).await?;
        Ok(body.sha)
    }

    async fn set_last_analyzed_sha(&self, repo_name: &str, sha: &str) -> Result<()> {
        let resp = self
            .client
            .put(self.url(&format!("/repos/{repo_name}/sha")))
            .json(&json!({ "sha": sha }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn upsert_file(&self, repo_name: &str, path: &str, name: &str) -> Result<()> {
        let resp = self
            .client
            .put(self.url(&format!("/repos/{repo_name}/files")))
            .json(&json!({ "path": path, "name": name }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn delete_file(&self, repo_name: &str, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/repos/{repo_name}/files")))
            .json(&json!({ "path": path }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn upsert_edge(&self, repo_name: &str, from_path: &str, to_path: &str, to_name: &str) -> Result<()> {
        let resp = self
            .client
            .put(self.url(&format!("/repos/{repo_name}/edges")))
            .json(&json!({ "from": from_path, "to": to_path, "toName": to_name }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn delete_outgoing_edges(&self, repo_name: &str, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/repos/{repo_name}/edges")))
            .json(&json!({ "from": path }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn dependencies(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&format!("/repos/{repo_name}/dependencies?path={path}")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        let body: PathsResponse = Self::decode(resp).await?;
        Ok(body.paths)
    }

    async fn dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&format!("/repos/{repo_name}/dependents?path={path}")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        let body: PathsResponse = Self::decode(resp).await?;
        Ok(body.paths)
    }

    async fn recursive_dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/repos/{repo_name}/recursive-dependents?path={path}"
            )))
            .send()
            .await
            .map_err(Self::transport_err)?;
        let body: PathsResponse = Self::decode(resp).await?;
        Ok(body.paths)
    }

    async fn full_graph(&self, repo_name: &str) -> Result<(Vec<FileNode>, Vec<(String, String)>)> {
        let resp = self
            .client
            .get(self.url(&format!("/repos/{repo_name}/graph")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        let body: FullGraphResponse = Self::decode(resp).await?;
        let files = body
            .nodes
            .into_iter()
            .map(|n| FileNode { path: n.id, name: n.label })
            .collect();
        let edges = body.edges.into_iter().map(|e| (e.from, e.to)).collect();
        Ok((files, edges))
    }

    async fn ensure_constraints(&self) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/admin/ensure-constraints"))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(resp).await?;
        Ok(())
    }
}
