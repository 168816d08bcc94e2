//! Domain types shared by the indexing pipeline and the search surface.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const GITHUB_WEB_URL: &str = "https://github.com";

/// A repository materialized as a local checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name` identifier.
    pub name: String,
    #[serde(rename = "path")]
    pub local_path: PathBuf,
    #[serde(rename = "url")]
    pub canonical_url: String,
}

impl Repository {
    #[must_use]
    pub fn new(name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let canonical_url = format!("{GITHUB_WEB_URL}/{name}");
        Self {
            name,
            local_path: local_path.into(),
            canonical_url,
        }
    }
}

/// A window of consecutive lines from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: String,
    pub code: String,
    /// Path relative to the repository root, `/`-separated.
    pub file_path: String,
    /// 1-based, inclusive.
    pub line_from: usize,
    /// 1-based, inclusive.
    pub line_to: usize,
    pub repo: Repository,
}

impl CodeSnippet {
    /// Point payload: the snippet's own fields, `repo` as a nested object.
    ///
    /// # Errors
    ///
    /// Fails if the checkout path is not valid UTF-8.
    pub fn to_payload(&self) -> Result<HashMap<String, serde_json::Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(HashMap::new()),
        }
    }

    /// Rebuild a snippet from a stored payload.
    ///
    /// # Errors
    ///
    /// Fails if a required field is missing or has the wrong type.
    pub fn from_payload(payload: HashMap<String, serde_json::Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(payload.into_iter().collect()))
    }
}

fn default_top_n() -> usize {
    10
}

/// Parameters of a similarity search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub allowed_repos: Option<Vec<String>>,
}

impl SearchQuery {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_n: default_top_n(),
            allowed_repos: None,
        }
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[must_use]
    pub fn with_allowed_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_repos = Some(repos.into_iter().map(Into::into).collect());
        self
    }
}

/// Snippets ranked by descending similarity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub snippets: Vec<CodeSnippet>,
}
