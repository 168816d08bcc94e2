//! Record of repositories fully indexed into a collection, persisted as JSON.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub collection: String,
    pub completed: BTreeSet<String>,
}

impl IndexManifest {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            completed: BTreeSet::new(),
        }
    }

    /// Manifest file location for `collection` under `dir`.
    #[must_use]
    pub fn path_for(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!(".codeseek-manifest-{collection}.json"))
    }

    /// Load the manifest, `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically: temp file in the same directory, then rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(self)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    #[must_use]
    pub fn is_complete(&self, repo: &str) -> bool {
        self.completed.contains(repo)
    }

    /// True when every name in `repos` has been recorded.
    #[must_use]
    pub fn covers<'a>(&self, repos: impl IntoIterator<Item = &'a String>) -> bool {
        repos.into_iter().all(|r| self.completed.contains(r))
    }

    pub fn mark_complete(&mut self, repo: impl Into<String>) {
        self.completed.insert(repo.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = IndexManifest::path_for(dir.path(), "code-search");
        assert!(IndexManifest::load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = IndexManifest::path_for(&dir.path().join("nested"), "code-search");
        let mut manifest = IndexManifest::new("code-search");
        manifest.mark_complete("octo/util");
        manifest.save(&path).await.unwrap();

        let loaded = IndexManifest::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.is_complete("octo/util"));
        assert!(!loaded.is_complete("octo/web"));
    }

    #[tokio::test]
    async fn corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = IndexManifest::path_for(dir.path(), "c");
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(IndexManifest::load(&path).await.is_err());
    }

    #[test]
    fn covers_all_configured() {
        let mut manifest = IndexManifest::new("c");
        manifest.mark_complete("a/b");
        let configured = vec!["a/b".to_owned(), "c/d".to_owned()];
        assert!(!manifest.covers(&configured));
        manifest.mark_complete("c/d");
        assert!(manifest.covers(&configured));
        assert!(manifest.covers(&Vec::<String>::new()));
    }

    #[test]
    fn path_is_per_collection() {
        let dir = Path::new("/data/repos");
        assert_ne!(
            IndexManifest::path_for(dir, "one"),
            IndexManifest::path_for(dir, "two")
        );
    }
}
