//! Shared test-only helpers for ephemera_core.

use crate::{Config, DocumentStore};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Configuration rooted at `root` with small, test-friendly limits.
pub(crate) fn test_config(root: &Path) -> Config {
    Config {
        doc_root: root.to_path_buf(),
        max_document_size: 1024,
        max_document_count: 100,
        default_lifetime: Duration::from_secs(3600),
        ..Config::default()
    }
}

/// Creates a bootstrapped store over an isolated temporary root.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation or bootstrap fails in the test environment.
pub(crate) async fn setup_temp_store<F>(tweak: F) -> (DocumentStore, TempDir)
where
    F: FnOnce(&mut Config),
{
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config(&temp_dir.path().join("docs"));
    tweak(&mut config);
    let store = DocumentStore::new(&config).expect("store");
    store.bootstrap().await.expect("bootstrap");
    (store, temp_dir)
}

/// Names of the files currently in `root`, sorted.
pub(crate) fn list_root(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .expect("read root")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .into_string()
                .expect("utf-8 name")
        })
        .collect();
    names.sort();
    names
}
