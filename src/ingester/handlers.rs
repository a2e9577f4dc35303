//! The single authenticated HTTP trigger endpoint. The bearer-token check
//! rejects before any work happens; there are no claims to inject on
//! success, just a shared-secret gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::http_error::AppError;
use crate::jobqueue::JobQueue;
use crate::model::AnalysisJob;

#[derive(Clone)]
pub struct IngesterState {
    pub queue: Arc<dyn JobQueue>,
    pub secret: String,
}

#[derive(Deserialize)]
pub struct TriggerRequest {
    #[serde(rename = "repoUrl")]
    pub repo_url: String,
    pub sha: String,
    pub event: String,
    #[serde(rename = "prNumber")]
    pub pr_number: Option<i64>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn trigger(
    State(state): State<IngesterState>,
    headers: HeaderMap,
    Json(body): Json<TriggerRequest>,
) -> Result<impl IntoResponse, AppError> {
    authenticate(&headers, &state.secret)?;

    if body.sha.trim().is_empty() || body.event.trim().is_empty() {
        return Err(AppError::BadRequest("sha and event are required".into()));
    }

    let repo_name = derive_repo_name(&body.repo_url)
        .ok_or_else(|| AppError::BadRequest(format!("malformed repoUrl: {}", body.repo_url)))?;

    let job = AnalysisJob {
        job_id: Uuid::new_v4().to_string(),
        repo_name,
        commit_sha: body.sha,
        event: body.event,
        pr_number: body.pr_number,
        received_at: Utc::now().to_rfc3339(),
    };

    state
        .queue
        .publish_analysis(&job)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "jobId": job.job_id }))))
}

/// Derives `owner/name` from a GitHub remote URL, accepting the same family
/// of forms a local git remote can have: `https://github.com/OWNER/REPO(.git)`,
/// `git@github.com:OWNER/REPO(.git)`, `ssh://git@github.com/OWNER/REPO(.git)`.
/// Returns `None` on anything else, including URLs with extra path segments.
fn derive_repo_name(repo_url: &str) -> Option<String> {
    let rest = repo_url
        .strip_prefix("https://github.com/")
        .or_else(|| repo_url.strip_prefix("http://github.com/"))
        .or_else(|| repo_url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| repo_url.strip_prefix("git@github.com:"))?;

    let trimmed = rest.trim_end_matches(".git").trim_end_matches('/');
    let mut parts = trimmed.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<(), AppError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("invalid Authorization header format".into()))?;

    if !constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        return Err(AppError::Forbidden("invalid token".into()));
    }

    Ok(())
}

/// Compares two byte slices in time independent of where they first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equal_strings() {
        assert!(constant_time_eq(b"secret", b"secret"));
    }

    #[test]
    fn constant_time_eq_rejects_mismatched_strings() {
        assert!(!constant_time_eq(b"secret", b"wrong"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }

    #[test]
    fn derive_repo_name_accepts_https() {
        assert_eq!(
            derive_repo_name("https://github.com/acme/widgets"),
            Some("acme/widgets".to_string())
        );
        assert_eq!(
            derive_repo_name("https://github.com/acme/widgets.git"),
            Some("acme/widgets".to_string())
        );
    }

    #[test]
    fn derive_repo_name_accepts_ssh_forms() {
        assert_eq!(
            derive_repo_name("git@github.com:acme/widgets.git"),
            Some("acme/widgets".to_string())
        );
        assert_eq!(
            derive_repo_name("ssh://git@github.com/acme/widgets.git"),
            Some("acme/widgets".to_string())
        );
    }

    #[test]
    fn derive_repo_name_rejects_malformed_urls() {
        assert_eq!(derive_repo_name("not a url"), None);
        assert_eq!(derive_repo_name("https://github.com/acme"), None);
        assert_eq!(
            derive_repo_name("https://github.com/acme/widgets/extra"),
            None
        );
    }
}
