//! Repository list: `{"repos": [{"type": "github", "repos": ["owner/name", ...]}]}`.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct RepoGroup {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub repos: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReposConfig {
    pub repos: Vec<RepoGroup>,
}

impl ReposConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid repository list.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// GitHub repository names in file order, duplicates removed.
    #[must_use]
    pub fn repo_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for group in &self.repos {
            if group.kind != "github" {
                tracing::warn!(kind = %group.kind, "ignoring unsupported repository group");
                continue;
            }
            for name in &group.repos {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

/// The repository configuration document as stored, for display.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON.
pub async fn load_raw(path: &Path) -> Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
