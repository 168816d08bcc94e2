//! Test-only mock embedder.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::embedder::{EmbedError, EmbedMode, Embedder};

type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Deterministic [`Embedder`]: equal texts map to equal vectors regardless of mode.
///
/// Clones share liveness, failure markers and counters, so a test can keep a
/// handle after passing the embedder to the indexer.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimensions: usize,
    /// Emit vectors one element longer than `dimensions`.
    pub wrong_dimension: bool,
    live: Arc<AtomicBool>,
    fail_markers: Arc<Mutex<Vec<String>>>,
    embed_calls: Arc<AtomicUsize>,
    probe_calls: Arc<AtomicUsize>,
    modes: Arc<Mutex<Vec<EmbedMode>>>,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            wrong_dimension: false,
            live: Arc::new(AtomicBool::new(true)),
            fail_markers: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            probe_calls: Arc::new(AtomicUsize::new(0)),
            modes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start with the probe reporting the endpoint as down.
    #[must_use]
    pub fn offline(dimensions: usize) -> Self {
        let mock = Self::new(dimensions);
        mock.set_live(false);
        mock
    }

    /// Fail every `embed` whose text contains `marker`.
    #[must_use]
    pub fn failing_on(self, marker: impl Into<String>) -> Self {
        self.fail_markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(marker.into());
        self
    }

    #[must_use]
    pub fn with_wrong_dimension(mut self) -> Self {
        self.wrong_dimension = true;
        self
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Modes of every `embed` call so far, in call order.
    #[must_use]
    pub fn modes(&self) -> Vec<EmbedMode> {
        self.modes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The vector this mock produces for `text`.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let len = if self.wrong_dimension {
            self.dimensions + 1
        } else {
            self.dimensions
        };
        // FNV-1a seed, then an xorshift stream.
        let mut state = text.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                #[expect(clippy::cast_precision_loss)]
                let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
                unit * 2.0 - 1.0
            })
            .collect()
    }
}

impl Embedder for MockEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
        mode: EmbedMode,
    ) -> BoxFuture<'a, Result<Vec<f32>, EmbedError>> {
        Box::pin(async move {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            self.modes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(mode);
            let fails = self
                .fail_markers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|m| text.contains(m.as_str()));
            if fails {
                return Err(EmbedError::Other("mock embedding failure".into()));
            }
            Ok(self.vector_for(text))
        })
    }

    fn probe(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.live.load(Ordering::SeqCst)
        })
    }
}
