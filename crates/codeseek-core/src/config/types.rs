use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub embedder: EmbedderSection,
    #[serde(default)]
    pub qdrant: QdrantSection,
    #[serde(default)]
    pub index: IndexSection,
    #[serde(default)]
    pub gateway: GatewaySection,
}

fn default_embedder_url() -> String {
    "http://localhost:8000/v1/embeddings".into()
}

fn default_embedder_model() -> String {
    "Qodo/Qodo-Embed-1-1.5B".into()
}

fn default_dimensions() -> u64 {
    1536
}

fn default_embed_timeout() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    5
}

/// OpenAI-compatible embedding endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedderSection {
    #[serde(default = "default_embedder_url")]
    pub url: String,
    #[serde(default = "default_embedder_model")]
    pub model: String,
    /// Vector length the model produces; also the collection's vector size.
    #[serde(default = "default_dimensions")]
    pub dimensions: u64,
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for EmbedderSection {
    fn default() -> Self {
        Self {
            url: default_embedder_url(),
            model: default_embedder_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_embed_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "code-search".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QdrantSection {
    /// gRPC endpoint.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for QdrantSection {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
        }
    }
}

fn default_repos_dir() -> PathBuf {
    PathBuf::from("./data/repos")
}

fn default_repos_config() -> PathBuf {
    PathBuf::from("repos_config.json")
}

fn default_batch_size() -> usize {
    50
}

fn default_window_size() -> usize {
    100
}

fn default_git_base_url() -> String {
    "https://github.com".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexSection {
    /// Where checkouts (and the index manifest) live.
    #[serde(default = "default_repos_dir")]
    pub repos_dir: PathBuf,
    /// JSON repository list.
    #[serde(default = "default_repos_config")]
    pub repos_config: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Lines per snippet.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_git_base_url")]
    pub git_base_url: String,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            repos_dir: default_repos_dir(),
            repos_config: default_repos_config(),
            batch_size: default_batch_size(),
            window_size: default_window_size(),
            git_base_url: default_git_base_url(),
        }
    }
}

fn default_gateway_bind() -> String {
    "0.0.0.0".into()
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_max_body() -> usize {
    1_048_576
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySection {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Bearer token required on every route except `/health` when set.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            auth_token: None,
            max_body_size: default_gateway_max_body(),
        }
    }
}
