use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDER_URL") {
            self.embedder.url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDER_MODEL") {
            self.embedder.model = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDER_DIMENSIONS")
            && let Ok(dims) = v.parse::<u64>()
        {
            self.embedder.dimensions = dims;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDER_TIMEOUT")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.embedder.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("CODESEEK_EMBEDDER_POLL_INTERVAL")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.embedder.poll_interval_secs = secs;
        }
        if let Ok(v) = std::env::var("CODESEEK_QDRANT_URL") {
            self.qdrant.url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_QDRANT_API_KEY") {
            self.qdrant.api_key = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = std::env::var("CODESEEK_COLLECTION") {
            self.qdrant.collection = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_REPOS_DIR") {
            self.index.repos_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CODESEEK_REPOS_CONFIG") {
            self.index.repos_config = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CODESEEK_BATCH_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.index.batch_size = n;
        }
        if let Ok(v) = std::env::var("CODESEEK_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_GATEWAY_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.gateway.port = port;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_GATEWAY_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_GATEWAY_TOKEN") {
            self.gateway.auth_token = if v.is_empty() { None } else { Some(v) };
        }
    }
}
