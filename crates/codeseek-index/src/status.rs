//! Indexing progress record: one writer (the orchestrator), any number of snapshot readers.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    #[default]
    NotStarted,
    WaitingForEmbedder,
    Indexing,
    Completed,
    Error,
}

impl IndexState {
    /// `completed` and `error` end the pipeline for the process lifetime.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub state: IndexState,
    pub total_docs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Writer half, held by the orchestrator.
#[derive(Debug)]
pub struct StatusTracker {
    tx: watch::Sender<IndexingStatus>,
}

/// Cloneable read handle.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    rx: watch::Receiver<IndexingStatus>,
}

/// Create a tracker in `not_started` and its read handle.
#[must_use]
pub fn status_channel() -> (StatusTracker, StatusHandle) {
    let (tx, rx) = watch::channel(IndexingStatus::default());
    (StatusTracker { tx }, StatusHandle { rx })
}

impl StatusTracker {
    #[must_use]
    pub fn snapshot(&self) -> IndexingStatus {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn handle(&self) -> StatusHandle {
        StatusHandle {
            rx: self.tx.subscribe(),
        }
    }

    pub fn set_state(&self, state: IndexState) {
        self.tx.send_modify(|s| s.state = state);
        tracing::info!(state = ?state, "indexing state changed");
    }

    pub fn add_docs(&self, n: u64) {
        self.tx.send_modify(|s| s.total_docs += n);
    }

    /// Terminal success with an explicit document count.
    pub fn complete(&self, total_docs: u64) {
        self.tx.send_modify(|s| {
            s.state = IndexState::Completed;
            s.total_docs = total_docs;
        });
        tracing::info!(total_docs, "indexing completed");
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "indexing failed");
        self.tx.send_modify(|s| {
            s.state = IndexState::Error;
            s.error = Some(message);
        });
    }
}

impl StatusHandle {
    #[must_use]
    pub fn snapshot(&self) -> IndexingStatus {
        self.rx.borrow().clone()
    }

    /// Wait until the state is terminal and return that snapshot.
    ///
    /// Returns the last seen snapshot if the tracker is dropped first.
    pub async fn wait_terminal(&mut self) -> IndexingStatus {
        let seen = self
            .rx
            .wait_for(|s| s.state.is_terminal())
            .await
            .map(|s| s.clone());
        match seen {
            Ok(s) => s,
            Err(_) => self.rx.borrow().clone(),
        }
    }
}
