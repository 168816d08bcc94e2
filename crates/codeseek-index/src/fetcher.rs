//! Materializes GitHub repositories as local checkouts.

use std::path::PathBuf;

use tokio::process::Command;

use crate::types::Repository;

const DEFAULT_GIT_BASE_URL: &str = "https://github.com";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid repository name '{0}', expected owner/name")]
    InvalidName(String),
    #[error("failed to run git: {0}")]
    Spawn(std::io::Error),
    #[error("git clone of {repo} failed with exit code {code}: {stderr}")]
    CloneFailed {
        repo: String,
        code: i32,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Clones repositories into `repos_dir`, one directory per repository.
#[derive(Debug, Clone)]
pub struct RepoFetcher {
    repos_dir: PathBuf,
    base_url: String,
}

impl RepoFetcher {
    #[must_use]
    pub fn new(repos_dir: impl Into<PathBuf>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
            base_url: DEFAULT_GIT_BASE_URL.to_owned(),
        }
    }

    /// Override the git remote host, e.g. a mirror or a local directory of bare repos.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    /// Deterministic checkout location for `repo_name`.
    #[must_use]
    pub fn local_path(&self, repo_name: &str) -> PathBuf {
        self.repos_dir.join(repo_name.replace('/', "_"))
    }

    #[must_use]
    pub fn clone_url(&self, repo_name: &str) -> String {
        format!("{}/{repo_name}.git", self.base_url)
    }

    /// Return the checkout for `repo_name`, cloning it on first use.
    ///
    /// An existing checkout is returned as-is, without pulling. The clone lands in a
    /// temporary sibling directory and is renamed into place only on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is malformed, `git` cannot be spawned, or the clone fails.
    pub async fn acquire(&self, repo_name: &str) -> Result<Repository, FetchError> {
        validate_repo_name(repo_name)?;

        let local_path = self.local_path(repo_name);
        if tokio::fs::try_exists(&local_path).await? {
            tracing::info!(repo = repo_name, path = %local_path.display(), "repository already cloned");
            return Ok(Repository::new(repo_name, local_path));
        }

        tokio::fs::create_dir_all(&self.repos_dir).await?;
        let tmp_path = self.repos_dir.join(format!(
            ".tmp_{}_{}",
            repo_name.replace('/', "_"),
            uuid::Uuid::new_v4().simple()
        ));

        let url = self.clone_url(repo_name);
        tracing::info!(repo = repo_name, %url, "cloning repository");

        let output = Command::new("git")
            .arg("clone")
            .arg("--quiet")
            .arg(&url)
            .arg(&tmp_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(FetchError::Spawn)?;

        if !output.status.success() {
            let _ = tokio::fs::remove_dir_all(&tmp_path).await;
            return Err(FetchError::CloneFailed {
                repo: repo_name.to_owned(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &local_path).await {
            let _ = tokio::fs::remove_dir_all(&tmp_path).await;
            return Err(e.into());
        }

        Ok(Repository::new(repo_name, local_path))
    }
}

fn validate_repo_name(name: &str) -> Result<(), FetchError> {
    let mut parts = name.split('/');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => [owner, repo].iter().all(|p| {
            !p.is_empty()
                && *p != "."
                && *p != ".."
                && p.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidName(name.to_owned()))
    }
}
