//! Language-agnostic chunking: fixed-size line windows over every source file of a checkout.

use std::path::Path;

use crate::languages::{has_excluded_component, is_excluded_dir, is_indexable};
use crate::types::{CodeSnippet, Repository};

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Lines per snippet (default: 100).
    pub window_size: usize,
    /// Snippets per embed/upsert batch (default: 50).
    pub batch_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            batch_size: 50,
        }
    }
}

/// Walk a checkout and split every eligible file into line windows.
///
/// Unreadable or non-UTF-8 files are logged and skipped. Output order is
/// deterministic for an unchanged checkout: files sorted by name, windows in
/// line order.
#[must_use]
pub fn extract(repo: &Repository, config: &ChunkerConfig) -> Vec<CodeSnippet> {
    let root = repo.local_path.as_path();
    let mut snippets = Vec::new();

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_some_and(|ft| ft.is_dir())
                    && entry.file_name().to_str().is_some_and(is_excluded_dir))
        })
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(repo = %repo.name, "walk error: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_indexable(entry.path()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if has_excluded_component(rel) {
            continue;
        }

        let source = match std::fs::read_to_string(entry.path()) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), "skipping unreadable file: {e}");
                continue;
            }
        };

        let rel_path = to_slash_path(rel);
        snippets.extend(chunk_source(&source, &rel_path, repo, config.window_size));
    }

    snippets
}

/// Split one file's text into `window_size`-line snippets, dropping blank windows.
#[must_use]
pub fn chunk_source(
    source: &str,
    file_path: &str,
    repo: &Repository,
    window_size: usize,
) -> Vec<CodeSnippet> {
    let window_size = window_size.max(1);
    let lines: Vec<&str> = source.lines().collect();

    lines
        .chunks(window_size)
        .enumerate()
        .filter_map(|(i, window)| {
            let code = window.join("\n");
            if code.trim().is_empty() {
                return None;
            }
            let start = i * window_size;
            Some(CodeSnippet {
                id: uuid::Uuid::new_v4().to_string(),
                code,
                file_path: file_path.to_owned(),
                line_from: start + 1,
                line_to: start + window.len(),
                repo: repo.clone(),
            })
        })
        .collect()
}

/// Split snippets into order-preserving batches of at most `size` items.
#[must_use]
pub fn batch(snippets: Vec<CodeSnippet>, size: usize) -> Vec<Vec<CodeSnippet>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(snippets.len().div_ceil(size));
    let mut iter = snippets.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(size).collect());
    }
    batches
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
