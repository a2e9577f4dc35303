//! HTTP surface for the graph-service binary: the wire contract
//! [`super::http_client::HttpGraphStoreClient`] speaks against, backed here
//! directly by a `Neo4jGraphStore`. `CorsLayer` + `TraceLayer`, axum 0.8
//! `{param}` path syntax. `repoName` is `owner/name`, so every repo-scoped
//! route takes `owner` and `repo` as two separate segments rather than one
//! `{repo}` capture that could never match a slash.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::graphstore::traits::GraphStore;
use crate::http_error::AppError;

pub type GraphServiceState = Arc<dyn GraphStore>;

pub fn create_router(state: GraphServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/repos/{owner}/{repo}", get(repo_exists))
        .route("/repos/{owner}/{repo}/sha", get(get_sha).put(set_sha))
        .route(
            "/repos/{owner}/{repo}/files",
            put(upsert_file).delete(delete_file),
        )
        .route(
            "/repos/{owner}/{repo}/edges",
            put(upsert_edge).delete(delete_edges),
        )
        .route("/repos/{owner}/{repo}/dependencies", get(dependencies))
        .route("/repos/{owner}/{repo}/dependents", get(dependents))
        .route(
            "/repos/{owner}/{repo}/recursive-dependents",
            get(recursive_dependents),
        )
        .route("/repos/{owner}/{repo}/graph", get(full_graph))
        .route("/admin/ensure-constraints", post(ensure_constraints))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn repo_name(owner: &str, repo: &str) -> String {
    format!("{owner}/{repo}")
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn repo_exists(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let exists = state.repo_exists(&repo).await?;
    if !exists {
        return Err(AppError::NotFound(format!("repo {repo} not found")));
    }
    Ok(Json(json!({ "exists": exists })))
}

async fn get_sha(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let sha = state.get_last_analyzed_sha(&repo).await?;
    Ok(Json(json!({ "sha": sha })))
}

#[derive(Deserialize)]
struct ShaBody {
    sha: String,
}

async fn set_sha(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<ShaBody>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    state.set_last_analyzed_sha(&repo, &body.sha).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct PathBody {
    path: String,
    name: String,
}

async fn upsert_file(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<PathBody>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    state.upsert_file(&repo, &body.path, &body.name).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct DeletePathBody {
    path: String,
}

async fn delete_file(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<DeletePathBody>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    state.delete_file(&repo, &body.path).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct EdgeBody {
    from: String,
    to: Option<String>,
    #[serde(rename = "toName")]
    to_name: Option<String>,
}

async fn upsert_edge(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<EdgeBody>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let to = body
        .to
        .ok_or_else(|| AppError::BadRequest("missing `to`".into()))?;
    let to_name = body
        .to_name
        .ok_or_else(|| AppError::BadRequest("missing `toName`".into()))?;
    state.upsert_edge(&repo, &body.from, &to, &to_name).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct DeleteEdgeBody {
    from: String,
}

async fn delete_edges(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<DeleteEdgeBody>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    state.delete_outgoing_edges(&repo, &body.from).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
struct PathQuery {
    path: String,
}

async fn dependencies(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(q): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let paths = state.dependencies(&repo, &q.path).await?;
    Ok(Json(json!({ "paths": paths })))
}

async fn dependents(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(q): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let paths = state.dependents(&repo, &q.path).await?;
    Ok(Json(json!({ "paths": paths })))
}

async fn recursive_dependents(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(q): Query<PathQuery>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let paths = state.recursive_dependents(&repo, &q.path).await?;
    Ok(Json(json!({ "paths": paths })))
}

async fn full_graph(
    State(state): State<GraphServiceState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let repo = repo_name(&owner, &repo);
    let (files, edges) = state.full_graph(&repo).await?;
    let nodes: Vec<Value> = files
        .into_iter()
        .map(|f| json!({ "id": f.path, "label": f.name }))
        .collect();
    let edges: Vec<Value> = edges
        .into_iter()
        .map(|(from, to)| json!({ "from": from, "to": to }))
        .collect();
    Ok(Json(json!({ "nodes": nodes, "edges": edges })))
}

async fn ensure_constraints(State(state): State<GraphServiceState>) -> Result<Json<Value>, AppError> {
    state.ensure_constraints().await?;
    Ok(Json(json!({ "ok": true })))
}
