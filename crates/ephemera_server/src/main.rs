//! Document server entrypoint.

use anyhow::Context;
use clap::Parser;
use ephemera_core::duration::parse_lifetime;
use ephemera_server::{serve_router, AppState, Config, DocumentStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line overrides applied on top of the environment configuration.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(
    name = "ephemera",
    version,
    about = "ephemera document server",
    after_help = "Each option overrides the environment variable in brackets.\n\
                  Documents found in the root at startup expire after the default lifetime."
)]
struct CliFlags {
    /// Listen address [BIND] (default: 127.0.0.1:1488)
    #[arg(short = 'l', long = "listen", value_name = "ADDR")]
    listen_addr: Option<SocketAddr>,

    /// Document root [DOC_ROOT] (default: docs)
    #[arg(short = 'd', long = "root", value_name = "DIR")]
    doc_root: Option<PathBuf>,

    /// Maximum document size in bytes [MAX_DOC_SIZE] (default: 10000000)
    #[arg(short = 's', long = "max-size", value_name = "BYTES")]
    max_document_size: Option<u64>,

    /// Maximum document count [MAX_DOC_COUNT] (default: 2000)
    #[arg(short = 'x', long = "max-count", value_name = "N")]
    max_document_count: Option<usize>,

    /// Default lifetime [DOC_LIFETIME] (default: 168h)
    #[arg(short = 't', long = "lifetime", value_name = "DURATION", value_parser = lifetime_flag)]
    default_lifetime: Option<Duration>,

    /// Default name length [DOC_NAME_LENGTH] (default: 9)
    #[arg(short = 'n', long = "name-length", value_name = "N")]
    default_name_length: Option<usize>,

    /// Default name charset [DOC_NAME_CHARSET] (default: a-z0-9)
    #[arg(short = 'c', long = "name-charset", value_name = "CHARS")]
    default_name_charset: Option<String>,
}

fn lifetime_flag(value: &str) -> Result<Duration, String> {
    parse_lifetime(value).map_err(|err| err.to_string())
}

impl CliFlags {
    fn apply(self, config: &mut Config) {
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(root) = self.doc_root {
            config.doc_root = root;
        }
        if let Some(size) = self.max_document_size {
            config.max_document_size = size;
        }
        if let Some(count) = self.max_document_count {
            config.max_document_count = count;
        }
        if let Some(lifetime) = self.default_lifetime {
            config.default_lifetime = lifetime;
        }
        if let Some(length) = self.default_name_length {
            config.default_name_length = length;
        }
        if let Some(charset) = self.default_name_charset {
            config.default_name_charset = charset;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemera=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli_flags = CliFlags::parse();

    let mut config = Config::from_env();
    cli_flags.apply(&mut config);
    config.validate()?;

    let store = DocumentStore::new(&config)?;
    store
        .bootstrap()
        .await
        .with_context(|| format!("Failed to load documents from {}", config.doc_root.display()))?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    let actual_addr = listener.local_addr().unwrap_or(config.listen_addr);
    tracing::info!(
        "ephemera serving {} at http://{}",
        config.doc_root.display(),
        actual_addr
    );

    let state = AppState::new(config, store.clone());
    let serve_result = serve_router(listener, state, shutdown_signal()).await;

    store.shutdown();
    serve_result?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
