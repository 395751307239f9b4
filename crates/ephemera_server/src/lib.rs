//! HTTP server wiring for ephemera (routes, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for document endpoints.
pub mod handlers;

pub use ephemera_core::{config, naming, store, AppError, Config, DocumentStore};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `store`: Document store built from the same configuration.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, store: DocumentStore) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// Upload size is capped by the store while streaming, so axum's default
/// body limit is disabled.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::document::usage).post(handlers::document::create_document),
        )
        .route("/:name", get(handlers::document::get_document))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::{serve_router, AppState};
    use ephemera_core::{Config, DocumentStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn serve_router_stops_on_shutdown_signal() {
        let temp_dir = TempDir::new().expect("temp dir");
        let config = Config {
            doc_root: temp_dir.path().join("docs"),
            ..Config::default()
        };
        let store = DocumentStore::new(&config).expect("store");
        store.bootstrap().await.expect("bootstrap");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");

        let state = AppState::new(config, store);
        serve_router(listener, state, async {})
            .await
            .expect("clean shutdown");
    }
}
