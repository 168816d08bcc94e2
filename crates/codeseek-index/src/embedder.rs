//! Embedding gateway: OpenAI-style `/embeddings` endpoint plus a cheap liveness probe.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Instruction prepended to search queries, as the embedding model expects.
pub const QUERY_INSTRUCTION: &str = "Instruct: Given Code or Text, retrieval relevant content\nQuery: ";

const PROBE_INPUT: &str = "test";

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("embedding response contained no vectors")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

/// How the text will be used, which decides the prompt sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    /// A natural-language search query; gets the retrieval instruction.
    Query,
    /// Raw code stored in the index; sent verbatim.
    Document,
}

/// Build the exact model input for `text` under `mode`.
#[must_use]
pub fn build_prompt(text: &str, mode: EmbedMode) -> String {
    match mode {
        EmbedMode::Query => format!("{QUERY_INSTRUCTION}query: {text}"),
        EmbedMode::Document => text.to_owned(),
    }
}

pub trait Embedder: Send + Sync {
    /// Embed one text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
        mode: EmbedMode,
    ) -> BoxFuture<'a, Result<Vec<f32>, EmbedError>>;

    /// Liveness check; never used to produce stored vectors.
    fn probe(&self) -> BoxFuture<'_, bool>;
}

/// Embedding endpoint configuration.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Full endpoint URL, e.g. `http://embedder:8000/v1/embeddings`.
    pub url: String,
    pub model: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/v1/embeddings".into(),
            model: "Qodo/Qodo-Embed-1-1.5B".into(),
            timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// [`Embedder`] over HTTP.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbedderConfig,
}

impl fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("url", &self.config.url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: EmbedderConfig) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("codeseek/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    async fn request_embedding(&self, prompt: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingRequest {
            input: prompt,
            model: &self.config.model,
        };

        let response = self
            .client
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("embedding API error {status}: {text}");
            return Err(EmbedError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;
        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbedError::EmptyResponse)
    }

    async fn check_available(&self) -> bool {
        let body = EmbeddingRequest {
            input: PROBE_INPUT,
            model: &self.config.model,
        };
        let response = match self
            .client
            .post(&self.config.url)
            .timeout(self.config.probe_timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("embedder probe failed: {e}");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("embedder probe: HTTP {}", response.status());
            return false;
        }

        match response.json::<serde_json::Value>().await {
            Ok(json) => json.get("data").is_some(),
            Err(e) => {
                tracing::debug!("embedder probe: unreadable body: {e}");
                false
            }
        }
    }
}

impl Embedder for HttpEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
        mode: EmbedMode,
    ) -> BoxFuture<'a, Result<Vec<f32>, EmbedError>> {
        Box::pin(async move {
            let prompt = build_prompt(text, mode);
            self.request_embedding(&prompt).await
        })
    }

    fn probe(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.check_available())
    }
}
