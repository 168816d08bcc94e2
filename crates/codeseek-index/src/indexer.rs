//! Indexing orchestrator: ensure collection → wait for embedder → fetch → chunk → embed → upsert.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::chunker::{self, ChunkerConfig};
use crate::embedder::{EmbedMode, Embedder};
use crate::error::{IndexError, Result};
use crate::fetcher::RepoFetcher;
use crate::manifest::IndexManifest;
use crate::repos::ReposConfig;
use crate::status::{IndexState, IndexingStatus, StatusHandle, StatusTracker, status_channel};
use crate::types::CodeSnippet;
use crate::vector_store::{VectorFilter, VectorPoint, VectorStore};

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub collection: String,
    /// Embedding dimensionality; every vector must have exactly this length.
    pub dimensions: u64,
    pub repos_config: PathBuf,
    pub manifest_path: PathBuf,
    pub poll_interval: Duration,
    pub chunker: ChunkerConfig,
}

enum Flow {
    Continue,
    Shutdown,
}

/// Drives one collection from empty (or partial) to `completed`.
pub struct CodeIndexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    fetcher: RepoFetcher,
    config: IndexerConfig,
    status: Arc<StatusTracker>,
}

impl std::fmt::Debug for CodeIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeIndexer")
            .field("config", &self.config)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl CodeIndexer {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        fetcher: RepoFetcher,
        config: IndexerConfig,
    ) -> Self {
        let (tracker, _) = status_channel();
        Self {
            store,
            embedder,
            fetcher,
            config,
            status: Arc::new(tracker),
        }
    }

    /// Read handle on this indexer's progress.
    #[must_use]
    pub fn status(&self) -> StatusHandle {
        self.status.handle()
    }

    /// Run the pipeline until a terminal state or shutdown.
    ///
    /// Errors are recorded in the status record rather than returned. On shutdown
    /// the state is left where it was.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> IndexingStatus {
        match self.run_inner(&mut shutdown).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Shutdown) => tracing::info!("indexing interrupted by shutdown"),
            Err(e) => self.status.fail(e.to_string()),
        }
        self.status.snapshot()
    }

    async fn run_inner(&self, shutdown: &mut watch::Receiver<bool>) -> Result<Flow> {
        let collection = self.config.collection.as_str();
        self.store
            .ensure_collection(collection, self.config.dimensions)
            .await?;

        let points = self
            .store
            .collection_stats(collection)
            .await?
            .map_or(0, |s| s.points_count);

        let mut repo_names = None;
        let mut manifest = IndexManifest::new(collection);

        if points > 0 {
            let Some(existing) = self.load_manifest().await else {
                tracing::info!(collection, points, "collection already populated, skipping indexing");
                self.status.complete(points);
                return Ok(Flow::Continue);
            };
            let names = self.load_repo_names().await?;
            if existing.covers(&names) {
                tracing::info!(collection, points, "all repositories already indexed");
                self.status.complete(points);
                return Ok(Flow::Continue);
            }
            manifest = existing;
            repo_names = Some(names);
        } else {
            // On disk before the first upsert; replaces any stale file.
            manifest.save(&self.config.manifest_path).await.map_err(|e| {
                IndexError::Other(format!(
                    "cannot persist index manifest {}: {e}",
                    self.config.manifest_path.display()
                ))
            })?;
        }

        self.status.set_state(IndexState::WaitingForEmbedder);
        if let Flow::Shutdown = self.wait_for_embedder(shutdown).await {
            return Ok(Flow::Shutdown);
        }

        self.status.set_state(IndexState::Indexing);
        let names = match repo_names {
            Some(names) => names,
            None => self.load_repo_names().await?,
        };
        let pending: Vec<String> = names
            .into_iter()
            .filter(|n| !manifest.is_complete(n))
            .collect();

        if points > 0 {
            self.purge(&pending).await?;
            let remaining = self
                .store
                .collection_stats(collection)
                .await?
                .map_or(0, |s| s.points_count);
            self.status.add_docs(remaining);
        }

        tracing::info!(repos = pending.len(), "indexing started");
        for name in pending {
            if *shutdown.borrow() {
                return Ok(Flow::Shutdown);
            }
            match self.index_repository(&name, shutdown).await {
                Ok(Flow::Continue) => {
                    manifest.mark_complete(name);
                    if let Err(e) = manifest.save(&self.config.manifest_path).await {
                        tracing::warn!("failed to persist index manifest: {e}");
                    }
                }
                Ok(Flow::Shutdown) => return Ok(Flow::Shutdown),
                Err(e @ IndexError::DimensionMismatch { .. }) => return Err(e),
                Err(e) => tracing::error!(repo = %name, "skipping repository: {e}"),
            }
        }

        self.status.complete(self.status.snapshot().total_docs);
        Ok(Flow::Continue)
    }

    async fn load_manifest(&self) -> Option<IndexManifest> {
        match IndexManifest::load(&self.config.manifest_path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("unreadable index manifest, re-indexing all repositories: {e}");
                Some(IndexManifest::new(&self.config.collection))
            }
        }
    }

    async fn load_repo_names(&self) -> Result<Vec<String>> {
        let config = ReposConfig::load(&self.config.repos_config)
            .await
            .map_err(|e| {
                IndexError::Other(format!(
                    "cannot load repository config {}: {e}",
                    self.config.repos_config.display()
                ))
            })?;
        Ok(config.repo_names())
    }

    async fn wait_for_embedder(&self, shutdown: &mut watch::Receiver<bool>) -> Flow {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = shutdown_signal(shutdown) => return Flow::Shutdown,
                _ = ticker.tick() => {
                    if self.embedder.probe().await {
                        tracing::info!("embedder is ready");
                        return Flow::Continue;
                    }
                    tracing::info!(
                        retry_in = ?self.config.poll_interval,
                        "embedder not ready, waiting"
                    );
                }
            }
        }
    }

    /// Remove leftovers of repositories that were started but never recorded complete.
    async fn purge(&self, repos: &[String]) -> Result<()> {
        if repos.is_empty() {
            return Ok(());
        }
        tracing::info!(repos = ?repos, "purging incomplete repositories");
        self.store
            .delete_by_filter(
                &self.config.collection,
                VectorFilter::any_of("repo.name", repos.to_vec()),
            )
            .await?;
        Ok(())
    }

    async fn index_repository(
        &self,
        name: &str,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<Flow> {
        let repo = self.fetcher.acquire(name).await?;

        let chunker_config = self.config.chunker.clone();
        let snippets =
            tokio::task::spawn_blocking(move || chunker::extract(&repo, &chunker_config)).await?;
        tracing::info!(repo = name, snippets = snippets.len(), "repository chunked");

        let batches = chunker::batch(snippets, self.config.chunker.batch_size);
        let total = batches.len();
        for (i, batch) in batches.into_iter().enumerate() {
            if *shutdown.borrow() {
                return Ok(Flow::Shutdown);
            }
            let points = self.embed_batch(batch).await?;
            if points.is_empty() {
                continue;
            }
            let n = points.len() as u64;
            self.store.upsert(&self.config.collection, points).await?;
            self.status.add_docs(n);
            tracing::info!(
                repo = name,
                progress = format_args!("{}/{total}", i + 1),
                upserted = n,
            );
        }
        Ok(Flow::Continue)
    }

    async fn embed_batch(&self, batch: Vec<CodeSnippet>) -> Result<Vec<VectorPoint>> {
        let mut points = Vec::with_capacity(batch.len());
        for snippet in batch {
            let vector = match self.embedder.embed(&snippet.code, EmbedMode::Document).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(
                        file = %snippet.file_path,
                        line_from = snippet.line_from,
                        "embedding failed, dropping snippet: {e}"
                    );
                    continue;
                }
            };
            if vector.len() as u64 != self.config.dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: self.config.dimensions,
                    actual: vector.len(),
                });
            }
            points.push(VectorPoint {
                id: snippet.id.clone(),
                vector,
                payload: snippet.to_payload()?,
            });
        }
        Ok(points)
    }
}

/// Resolves once shutdown is requested; never resolves if the sender is gone.
async fn shutdown_signal(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run the indexer on its own task, recording a panic as an `error` state.
pub fn spawn_indexer(indexer: CodeIndexer, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let tracker = Arc::clone(&indexer.status);
    tokio::spawn(async move {
        let inner = tokio::spawn(async move { indexer.run(shutdown).await });
        match inner.await {
            Ok(status) => tracing::debug!(state = ?status.state, "indexer task finished"),
            Err(e) if e.is_panic() => tracker.fail(format!("indexer task panicked: {e}")),
            Err(e) => tracker.fail(format!("indexer task aborted: {e}")),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::embedder::EmbedError;
    use crate::in_memory_store::InMemoryVectorStore;
    use crate::mock::MockEmbedder;
    use crate::types::Repository;

    const DIM: u64 = 8;
    const COLLECTION: &str = "code-search";

    struct Fixture {
        _dir: tempfile::TempDir,
        repos_dir: PathBuf,
        config: IndexerConfig,
        store: Arc<InMemoryVectorStore>,
    }

    impl Fixture {
        fn new(repos: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let repos_dir = dir.path().join("repos");
            std::fs::create_dir_all(&repos_dir).unwrap();
            let repos_config = dir.path().join("repos_config.json");
            let doc = serde_json::json!({"repos": [{"type": "github", "repos": repos}]});
            std::fs::write(&repos_config, doc.to_string()).unwrap();
            let config = IndexerConfig {
                collection: COLLECTION.into(),
                dimensions: DIM,
                repos_config,
                manifest_path: IndexManifest::path_for(&repos_dir, COLLECTION),
                poll_interval: Duration::from_millis(10),
                chunker: ChunkerConfig::default(),
            };
            Self {
                _dir: dir,
                repos_dir,
                config,
                store: Arc::new(InMemoryVectorStore::new()),
            }
        }

        /// Lay out a checkout so the fetcher finds it without cloning.
        fn checkout(&self, repo: &str, files: &[(&str, String)]) -> PathBuf {
            let root = self.repos_dir.join(repo.replace('/', "_"));
            for (rel, content) in files {
                let path = root.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, content).unwrap();
            }
            root
        }

        fn indexer(&self, embedder: &MockEmbedder) -> CodeIndexer {
            CodeIndexer::new(
                self.store.clone(),
                Arc::new(embedder.clone()),
                RepoFetcher::new(&self.repos_dir),
                self.config.clone(),
            )
        }

        async fn points(&self) -> u64 {
            self.store
                .collection_stats(COLLECTION)
                .await
                .unwrap()
                .map_or(0, |s| s.points_count)
        }

        async fn seed(&self, repo: &str, ids: &[&str]) {
            self.store.ensure_collection(COLLECTION, DIM).await.unwrap();
            let points = ids
                .iter()
                .map(|id| {
                    let snippet = CodeSnippet {
                        id: (*id).to_owned(),
                        code: format!("seeded {id}"),
                        file_path: "seed.py".into(),
                        line_from: 1,
                        line_to: 1,
                        repo: Repository::new(repo, Path::new("/seed")),
                    };
                    VectorPoint {
                        id: (*id).to_owned(),
                        vector: vec![0.5; 8],
                        payload: snippet.to_payload().unwrap(),
                    }
                })
                .collect();
            self.store.upsert(COLLECTION, points).await.unwrap();
        }
    }

    fn lines(n: usize) -> String {
        (1..=n).map(|i| format!("x_{i} = {i}\n")).collect()
    }

    fn no_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn fresh_index_of_single_file() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("app/main.py", lines(250))]);
        let embedder = MockEmbedder::new(8);

        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 3);
        assert_eq!(fx.points().await, 3);
        assert_eq!(embedder.embed_calls(), 3);
        assert!(embedder.modes().iter().all(|m| *m == EmbedMode::Document));

        let manifest = IndexManifest::load(&fx.config.manifest_path)
            .await
            .unwrap()
            .unwrap();
        assert!(manifest.is_complete("octo/util"));
    }

    #[tokio::test]
    async fn populated_collection_without_manifest_skips_work() {
        let fx = Fixture::new(&["octo/util"]);
        fx.seed("octo/util", &["a", "b"]).await;
        let embedder = MockEmbedder::offline(8);

        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 2);
        assert_eq!(embedder.embed_calls(), 0);
        assert_eq!(embedder.probe_calls(), 0);
    }

    #[tokio::test]
    async fn rerun_after_completion_embeds_nothing() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("lib.rs", lines(120))]);
        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        fx.indexer(&embedder).run(rx.clone()).await;
        let calls = embedder.embed_calls();

        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, fx.points().await);
        assert_eq!(embedder.embed_calls(), calls);
    }

    #[tokio::test]
    async fn resume_purges_and_reindexes_only_incomplete_repos() {
        let fx = Fixture::new(&["octo/util", "octo/web"]);
        fx.checkout("octo/util", &[("a.py", lines(10))]);
        fx.checkout("octo/web", &[("b.js", lines(150))]);
        fx.seed("octo/util", &["util-1"]).await;
        fx.seed("octo/web", &["stale-1", "stale-2", "stale-3"]).await;
        let mut manifest = IndexManifest::new(COLLECTION);
        manifest.mark_complete("octo/util");
        manifest.save(&fx.config.manifest_path).await.unwrap();

        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(embedder.embed_calls(), 2);
        assert_eq!(fx.points().await, 3);
        assert_eq!(status.total_docs, 3);

        let web_only = VectorFilter::any_of("repo.name", vec!["octo/web".into()]);
        let web = fx
            .store
            .search(COLLECTION, vec![1.0; 8], 10, Some(web_only))
            .await
            .unwrap();
        assert_eq!(web.len(), 2);
        assert!(web.iter().all(|p| !p.id.starts_with("stale")));
    }

    #[tokio::test]
    async fn failed_snippet_is_dropped() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout(
            "octo/util",
            &[
                ("a.py", "ok = 1\n".into()),
                ("b.py", "BOOM = 1\n".into()),
                ("c.py", "fine = 2\n".into()),
            ],
        );
        let embedder = MockEmbedder::new(8).failing_on("BOOM");
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 2);
        assert_eq!(embedder.embed_calls(), 3);
    }

    #[tokio::test]
    async fn wrong_vector_length_is_fatal() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("a.py", lines(5))]);
        let embedder = MockEmbedder::new(8).with_wrong_dimension();
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Error);
        assert!(status.error.unwrap().contains("dimension mismatch"));
        assert_eq!(fx.points().await, 0);
    }

    #[tokio::test]
    async fn existing_collection_with_other_dimension_is_error() {
        let fx = Fixture::new(&["octo/util"]);
        fx.store.ensure_collection(COLLECTION, 4).await.unwrap();
        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Error);
        assert_eq!(embedder.embed_calls(), 0);
    }

    #[tokio::test]
    async fn missing_repo_config_is_error() {
        let fx = Fixture::new(&["octo/util"]);
        std::fs::remove_file(&fx.config.repos_config).unwrap();
        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Error);
        assert!(status.error.unwrap().contains("repository config"));
    }

    #[tokio::test]
    async fn failing_repository_is_skipped() {
        let fx = Fixture::new(&["not-a-repo", "octo/util"]);
        fx.checkout("octo/util", &[("a.go", lines(3))]);
        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 1);
        let manifest = IndexManifest::load(&fx.config.manifest_path)
            .await
            .unwrap()
            .unwrap();
        assert!(!manifest.is_complete("not-a-repo"));
        assert!(manifest.is_complete("octo/util"));
    }

    #[tokio::test]
    async fn empty_repo_list_completes_with_zero() {
        let fx = Fixture::new(&[]);
        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 0);
    }

    #[tokio::test]
    async fn waits_for_embedder_then_indexes() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("a.py", lines(10))]);
        let embedder = MockEmbedder::offline(8);
        let indexer = fx.indexer(&embedder);
        let mut status = indexer.status();

        let (_tx, rx) = no_shutdown();
        let task = spawn_indexer(indexer, rx);

        while embedder.probe_calls() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(status.snapshot().state, IndexState::WaitingForEmbedder);
        assert_eq!(embedder.embed_calls(), 0);

        embedder.set_live(true);
        let done = status.wait_terminal().await;
        task.await.unwrap();
        assert_eq!(done.state, IndexState::Completed);
        assert_eq!(done.total_docs, 1);
    }

    #[tokio::test]
    async fn shutdown_interrupts_polling() {
        let fx = Fixture::new(&["octo/util"]);
        let embedder = MockEmbedder::offline(8);
        let indexer = fx.indexer(&embedder);
        let status = indexer.status();

        let (tx, rx) = watch::channel(false);
        let task = spawn_indexer(indexer, rx);
        while embedder.probe_calls() < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.snapshot().state, IndexState::WaitingForEmbedder);
    }

    #[tokio::test]
    async fn shutdown_before_indexing_leaves_no_points() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("a.py", lines(10))]);
        let embedder = MockEmbedder::new(8);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::WaitingForEmbedder);
        assert_eq!(fx.points().await, 0);
    }

    struct PanickingEmbedder;

    type TestFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

    impl Embedder for PanickingEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
            _mode: EmbedMode,
        ) -> TestFuture<'a, std::result::Result<Vec<f32>, EmbedError>> {
            Box::pin(async move {
                if text.is_empty() {
                    return Ok(Vec::new());
                }
                panic!("embedder exploded")
            })
        }

        fn probe(&self) -> TestFuture<'_, bool> {
            Box::pin(async { true })
        }
    }

    #[tokio::test]
    async fn panic_is_captured_as_error() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("a.py", lines(3))]);
        let indexer = CodeIndexer::new(
            fx.store.clone(),
            Arc::new(PanickingEmbedder),
            RepoFetcher::new(&fx.repos_dir),
            fx.config.clone(),
        );
        let status = indexer.status();
        let (_tx, rx) = no_shutdown();
        spawn_indexer(indexer, rx).await.unwrap();

        let snap = status.snapshot();
        assert_eq!(snap.state, IndexState::Error);
        assert!(snap.error.unwrap().contains("panicked"));
    }

    /// Requests shutdown from inside its first `embed` call.
    struct InterruptingEmbedder {
        inner: MockEmbedder,
        shutdown: watch::Sender<bool>,
    }

    impl Embedder for InterruptingEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
            mode: EmbedMode,
        ) -> TestFuture<'a, std::result::Result<Vec<f32>, EmbedError>> {
            self.shutdown.send_replace(true);
            self.inner.embed(text, mode)
        }

        fn probe(&self) -> TestFuture<'_, bool> {
            self.inner.probe()
        }
    }

    async fn interrupted_run(fx: &Fixture) -> IndexingStatus {
        let (tx, rx) = watch::channel(false);
        let indexer = CodeIndexer::new(
            fx.store.clone(),
            Arc::new(InterruptingEmbedder {
                inner: MockEmbedder::new(8),
                shutdown: tx,
            }),
            RepoFetcher::new(&fx.repos_dir),
            fx.config.clone(),
        );
        indexer.run(rx).await
    }

    #[tokio::test]
    async fn interrupted_first_repository_is_reindexed_on_restart() {
        let mut fx = Fixture::new(&["octo/util"]);
        fx.config.chunker.batch_size = 1;
        fx.checkout("octo/util", &[("app/main.py", lines(250))]);

        let status = interrupted_run(&fx).await;
        assert_eq!(status.state, IndexState::Indexing);
        assert_eq!(fx.points().await, 1);
        let manifest = IndexManifest::load(&fx.config.manifest_path)
            .await
            .unwrap()
            .expect("manifest written before the first upsert");
        assert!(manifest.completed.is_empty());

        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 3);
        assert_eq!(fx.points().await, 3);
        assert_eq!(embedder.embed_calls(), 3);
    }

    #[tokio::test]
    async fn stale_manifest_is_replaced_on_empty_collection() {
        let mut fx = Fixture::new(&["octo/util"]);
        fx.config.chunker.batch_size = 1;
        fx.checkout("octo/util", &[("app/main.py", lines(250))]);
        let mut stale = IndexManifest::new(COLLECTION);
        stale.mark_complete("octo/util");
        stale.save(&fx.config.manifest_path).await.unwrap();

        interrupted_run(&fx).await;
        let manifest = IndexManifest::load(&fx.config.manifest_path)
            .await
            .unwrap()
            .unwrap();
        assert!(!manifest.is_complete("octo/util"));

        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(fx.points().await, 3);
    }

    #[tokio::test]
    async fn unwritable_manifest_is_error_before_indexing() {
        let mut fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("a.py", lines(3))]);
        let blocker = fx.repos_dir.join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        fx.config.manifest_path = blocker.join("manifest.json");

        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;
        assert_eq!(status.state, IndexState::Error);
        assert!(status.error.unwrap().contains("index manifest"));
        assert_eq!(embedder.embed_calls(), 0);
    }

    #[tokio::test]
    async fn corrupt_manifest_purges_and_reindexes_everything() {
        let fx = Fixture::new(&["octo/util"]);
        fx.checkout("octo/util", &[("lib.py", lines(150))]);
        fx.seed("octo/util", &["stale-1", "stale-2", "stale-3"]).await;
        std::fs::write(&fx.config.manifest_path, "{not json").unwrap();

        let embedder = MockEmbedder::new(8);
        let (_tx, rx) = no_shutdown();
        let status = fx.indexer(&embedder).run(rx).await;

        assert_eq!(status.state, IndexState::Completed);
        assert_eq!(status.total_docs, 2);
        assert_eq!(fx.points().await, 2);
        let hits = fx
            .store
            .search(COLLECTION, vec![1.0; 8], 10, None)
            .await
            .unwrap();
        assert!(hits.iter().all(|p| !p.id.starts_with("stale")));

        let manifest = IndexManifest::load(&fx.config.manifest_path)
            .await
            .unwrap()
            .unwrap();
        assert!(manifest.is_complete("octo/util"));
    }
}
