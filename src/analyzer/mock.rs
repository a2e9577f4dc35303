//! Test doubles for the external collaborators, seeded directly via public
//! fields the way the rest of this crate's mocks expose their state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::analyzer::traits::{ImportExtractor, Result, SourceProvider};
use crate::model::DiffEntry;

/// A fixture keyed by `(repo_name, commit_sha)`: the full file listing at
/// that commit, and the diff against whatever commit preceded it in the
/// fixture's configured history.
#[derive(Default)]
pub struct MockSourceProvider {
    pub file_listings: RwLock<HashMap<(String, String), Vec<String>>>,
    pub diffs: RwLock<HashMap<(String, String, String), Vec<DiffEntry>>>,
    pub cloned: RwLock<Vec<(String, String)>>,
    pub deepened: RwLock<Vec<String>>,
}

impl MockSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_listing(&self, repo: &str, sha: &str, files: Vec<String>) {
        self.file_listings
            .write()
            .unwrap()
            .insert((repo.to_string(), sha.to_string()), files);
    }

    pub fn seed_diff(&self, repo: &str, from_sha: &str, to_sha: &str, entries: Vec<DiffEntry>) {
        self.diffs.write().unwrap().insert(
            (repo.to_string(), from_sha.to_string(), to_sha.to_string()),
            entries,
        );
    }
}

#[async_trait]
impl SourceProvider for MockSourceProvider {
    async fn shallow_clone(&self, repo_name: &str, commit_sha: &str, _dest: &Path) -> Result<()> {
        self.cloned
            .write()
            .unwrap()
            .push((repo_name.to_string(), commit_sha.to_string()));
        Ok(())
    }

    async fn fetch_and_checkout(&self, _repo_name: &str, _commit_sha: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }

    async fn deepen_clone(&self, repo_name: &str, _dest: &Path) -> Result<()> {
        self.deepened.write().unwrap().push(repo_name.to_string());
        Ok(())
    }

    async fn diff(&self, repo_name: &str, from_sha: &str, to_sha: &str) -> Result<Vec<DiffEntry>> {
        Ok(self
            .diffs
            .read()
            .unwrap()
            .get(&(repo_name.to_string(), from_sha.to_string(), to_sha.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_files(&self, dest: &Path) -> Result<Vec<String>> {
        // The worker names each mirror directory after its repo
        // (`repo_name.replace('/', "__")`); match on that last component so
        // a fixture only needs to know the repo name and commit sha, not
        // the worker's on-disk layout.
        let dir_name = dest.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let listings = self.file_listings.read().unwrap();
        Ok(listings
            .iter()
            .find(|((repo, _), _)| repo.replace('/', "__") == dir_name)
            .map(|(_, files)| files.clone())
            .unwrap_or_default())
    }
}

/// Imports keyed by `(repo_root-tagged path, path)`; seeded with plain
/// `path -> imports` pairs since tests always use one repo root per fixture.
#[derive(Default)]
pub struct MockImportExtractor {
    pub imports: RwLock<HashMap<String, Vec<String>>>,
}

impl MockImportExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, path: &str, imports: Vec<String>) {
        self.imports.write().unwrap().insert(path.to_string(), imports);
    }
}

#[async_trait]
impl ImportExtractor for MockImportExtractor {
    async fn extract_imports(&self, _repo_root: &Path, path: &str) -> Result<Vec<String>> {
        Ok(self.imports.read().unwrap().get(path).cloned().unwrap_or_default())
    }
}
