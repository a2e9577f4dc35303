//! In-memory `GraphStore` for tests. Backing maps are public `RwLock`
//! fields so tests can seed state directly rather than through a builder.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::graphstore::traits::{GraphStore, Result};
use crate::model::{basename, FileNode};

#[derive(Default)]
pub struct MockGraphStore {
    pub repos: RwLock<HashMap<String, Option<String>>>,
    /// `(repo, path) -> name`.
    pub files: RwLock<HashMap<(String, String), String>>,
    pub edges: RwLock<HashSet<(String, String, String)>>,
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn repo_exists(&self, repo_name: &str) -> Result<bool> {
        Ok(self.repos.read().unwrap().contains_key(repo_name))
    }

    async fn get_last_analyzed_sha(&self, repo_name: &str) -> Result<Option<String>> {
        Ok(self.repos.read().unwrap().get(repo_name).cloned().flatten())
    }

    async fn set_last_analyzed_sha(&self, repo_name: &str, sha: &str) -> Result<()> {
        self.repos
            .write()
            .unwrap()
            .insert(repo_name.to_string(), Some(sha.to_string()));
        Ok(())
    }

    async fn upsert_file(&self, repo_name: &str, path: &str, name: &str) -> Result<()> {
        self.repos
            .write()
            .unwrap()
            .entry(repo_name.to_string())
            .or_insert(None);
        self.files
            .write()
            .unwrap()
            .insert((repo_name.to_string(), path.to_string()), name.to_string());
        Ok(())
    }

    async fn delete_file(&self, repo_name: &str, path: &str) -> Result<()> {
        self.files
            .write()
            .unwrap()
            .remove(&(repo_name.to_string(), path.to_string()));
        self.edges
            .write()
            .unwrap()
            .retain(|(repo, from, to)| !(repo == repo_name && (from == path || to == path)));
        Ok(())
    }

    async fn upsert_edge(&self, repo_name: &str, from_path: &str, to_path: &str, to_name: &str) -> Result<()> {
        // Ensure both endpoints exist: the target via the given name, the
        // source via its basename if it isn't already tracked.
        self.files
            .write()
            .unwrap()
            .entry((repo_name.to_string(), to_path.to_string()))
            .or_insert_with(|| to_name.to_string());
        self.files
            .write()
            .unwrap()
            .entry((repo_name.to_string(), from_path.to_string()))
            .or_insert_with(|| basename(from_path).to_string());
        self.edges.write().unwrap().insert((
            repo_name.to_string(),
            from_path.to_string(),
            to_path.to_string(),
        ));
        Ok(())
    }

    async fn delete_outgoing_edges(&self, repo_name: &str, path: &str) -> Result<()> {
        self.edges
            .write()
            .unwrap()
            .retain(|(repo, from, _)| !(repo == repo_name && from == path));
        Ok(())
    }

    async fn dependencies(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let edges = self.edges.read().unwrap();
        Ok(edges
            .iter()
            .filter(|(repo, from, _)| repo == repo_name && from == path)
            .map(|(_, _, to)| to.clone())
            .collect())
    }

    async fn dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let edges = self.edges.read().unwrap();
        Ok(edges
            .iter()
            .filter(|(repo, _, to)| repo == repo_name && to == path)
            .map(|(_, from, _)| from.clone())
            .collect())
    }

    async fn recursive_dependents(&self, repo_name: &str, path: &str) -> Result<Vec<String>> {
        let edges = self.edges.read().unwrap();
        // `path` itself seeds `visited` so a cycle that loops back to it
        // never re-adds it to the result.
        let mut visited: HashSet<String> = HashSet::from([path.to_string()]);
        let mut frontier = vec![path.to_string()];

        while let Some(current) = frontier.pop() {
            for (repo, from, to) in edges.iter() {
                if repo == repo_name && to == &current && visited.insert(from.clone()) {
                    frontier.push(from.clone());
                }
            }
        }

        visited.remove(path);
        Ok(visited.into_iter().collect())
    }

    async fn full_graph(&self, repo_name: &str) -> Result<(Vec<FileNode>, Vec<(String, String)>)> {
        let files = self
            .files
            .read()
            .unwrap()
            .iter()
            .filter(|((repo, _), _)| repo == repo_name)
            .map(|((_, path), name)| FileNode {
                path: path.clone(),
                name: name.clone(),
            })
            .collect();
        let edges = self
            .edges
            .read()
            .unwrap()
            .iter()
            .filter(|(repo, _, _)| repo == repo_name)
            .map(|(_, from, to)| (from.clone(), to.clone()))
            .collect();
        Ok((files, edges))
    }

    async fn ensure_constraints(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_file_is_idempotent() {
        let store = MockGraphStore::new();
        store.upsert_file("acme/widgets", "a.ts", "a.ts").await.unwrap();
        store.upsert_file("acme/widgets", "a.ts", "a.ts").await.unwrap();
        let (files, _) = store.full_graph("acme/widgets").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.ts");
    }

    #[tokio::test]
    async fn recursive_dependents_is_cycle_safe() {
        let store = MockGraphStore::new();
        for f in ["a.ts", "b.ts", "c.ts"] {
            store.upsert_file("r", f, f).await.unwrap();
        }
        // a -> b -> c -> a (cycle)
        store.upsert_edge("r", "a.ts", "b.ts", "b.ts").await.unwrap();
        store.upsert_edge("r", "b.ts", "c.ts", "c.ts").await.unwrap();
        store.upsert_edge("r", "c.ts", "a.ts", "a.ts").await.unwrap();

        let mut deps = store.recursive_dependents("r", "b.ts").await.unwrap();
        deps.sort();
        assert_eq!(deps, vec!["a.ts".to_string(), "c.ts".to_string()]);
    }

    #[tokio::test]
    async fn delete_file_removes_touching_edges() {
        let store = MockGraphStore::new();
        store.upsert_file("r", "a.ts", "a.ts").await.unwrap();
        store.upsert_file("r", "b.ts", "b.ts").await.unwrap();
        store.upsert_edge("r", "a.ts", "b.ts", "b.ts").await.unwrap();

        store.delete_file("r", "b.ts").await.unwrap();

        assert!(store.dependencies("r", "a.ts").await.unwrap().is_empty());
    }
}
