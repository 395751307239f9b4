//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use ephemera_server::{create_app, AppState, Config, DocumentStore};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) fn test_config_for_root(root: &Path) -> Config {
    Config {
        doc_root: root.to_path_buf(),
        max_document_size: 1024,
        max_document_count: 100,
        default_lifetime: Duration::from_secs(3600),
        ..Config::default()
    }
}

pub(crate) async fn test_server_for_config(config: Config) -> (TestServer, DocumentStore) {
    let store = DocumentStore::new(&config).expect("store");
    store.bootstrap().await.expect("bootstrap");
    let state = AppState::new(config, store.clone());
    let server = TestServer::new(create_app(state)).expect("server");
    (server, store)
}

pub(crate) async fn setup_test_server_with<F>(tweak: F) -> (TestServer, DocumentStore, TempDir)
where
    F: FnOnce(&mut Config),
{
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config_for_root(&temp_dir.path().join("docs"));
    tweak(&mut config);
    let (server, store) = test_server_for_config(config).await;
    (server, store, temp_dir)
}

pub(crate) async fn setup_test_server() -> (TestServer, DocumentStore, TempDir) {
    setup_test_server_with(|_| {}).await
}
