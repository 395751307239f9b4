//! Document lifecycle: name allocation, admission control, persistence and expiry.
//!
//! Each document is one file named after its generated name, stored flat
//! under the document root with owner-only permissions. No metadata is kept
//! on disk, so a restart re-arms every surviving document with the default
//! lifetime.
//!
//! Creation is serialized through a single async mutex guarding the name
//! index; only allocation and reservation happen under it; the payload is
//! streamed after the lock is released. Reads never take the lock: a read
//! racing an unfinished upload sees whatever bytes have been written so far.

mod counter;
mod expiry;


pub use counter::DocumentCounter;
pub use expiry::{Armed, ExpiryScheduler};

use crate::config::Config;
use crate::error::AppError;
use crate::naming::{allocate_name, is_valid_document_name, validate_name_length, Alphabet};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// Per-request overrides for [`DocumentStore::create`].
///
/// Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub lifetime: Option<Duration>,
    pub alphabet: Option<Alphabet>,
    pub name_length: Option<usize>,
}

struct StoreInner {
    root: PathBuf,
    max_document_size: u64,
    max_document_count: usize,
    default_lifetime: Duration,
    default_alphabet: Alphabet,
    default_name_length: usize,
    /// Reserved and stored names. Locking it is the creation critical section.
    names: Mutex<HashSet<String>>,
    counter: DocumentCounter,
    expiry: ExpiryScheduler,
}

/// Owns the document root and every document's lifecycle.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

impl DocumentStore {
    /// Construct a store from configuration.
    ///
    /// Does not touch the filesystem; call [`DocumentStore::bootstrap`] once
    /// before serving requests.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when the configured defaults are invalid.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                root: config.doc_root.clone(),
                max_document_size: config.max_document_size,
                max_document_count: config.max_document_count,
                default_lifetime: config.default_lifetime,
                default_alphabet: config.default_alphabet()?,
                default_name_length: config.default_name_length,
                names: Mutex::new(HashSet::new()),
                counter: DocumentCounter::default(),
                expiry: ExpiryScheduler::default(),
            }),
        })
    }

    /// Document root directory.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Live documents as seen by admission control.
    pub fn document_count(&self) -> usize {
        self.inner.counter.get()
    }

    /// Deletions armed but not yet fired.
    pub fn pending_expiries(&self) -> usize {
        self.inner.expiry.pending()
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.inner.root.join(name)
    }

    /// Recover documents left on disk by a previous process.
    ///
    /// Creates the root if missing, indexes every regular file found in it,
    /// and arms a deletion with the *default* lifetime for each; original
    /// lifetimes are not recoverable.
    ///
    /// # Returns
    /// The number of documents recovered.
    ///
    /// # Errors
    /// Returns [`AppError::Storage`] if the root cannot be created or listed.
    pub async fn bootstrap(&self) -> Result<usize, AppError> {
        create_root(&self.inner.root).await?;

        let mut found = Vec::new();
        let mut entries = fs::read_dir(&self.inner.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                tracing::debug!("Skipping non-file entry {:?}", entry.path());
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_valid_document_name(&name) => found.push(name),
                Ok(name) => tracing::warn!("Skipping unaddressable document '{}'", name),
                Err(raw) => tracing::warn!("Skipping non UTF-8 document name {:?}", raw),
            }
        }

        {
            let mut names = self.inner.names.lock().await;
            names.extend(found.iter().cloned());
        }
        for name in &found {
            self.schedule_deletion(name, self.inner.default_lifetime);
        }

        tracing::info!(
            "Recovered {} document(s) from {}, expiring in {:?}",
            found.len(),
            self.inner.root.display(),
            self.inner.default_lifetime
        );
        Ok(found.len())
    }

    /// Store a new document and return its generated name.
    ///
    /// # Arguments
    /// - `payload`: Document bytes; anything past the configured maximum size
    ///   is discarded.
    /// - `options`: Per-request lifetime and naming overrides.
    ///
    /// # Returns
    /// The name the document can be read back under until it expires.
    ///
    /// # Errors
    /// - [`AppError::CapacityExceeded`] when the document count is at its maximum.
    /// - [`AppError::BadRequest`] for an out-of-range name length.
    /// - [`AppError::NameSpaceExhausted`] when no free name exists.
    /// - [`AppError::EmptyDocument`] when the payload has no bytes.
    /// - [`AppError::Storage`] on I/O failure; the reservation is removed.
    pub async fn create<R>(&self, payload: R, options: CreateOptions) -> Result<String, AppError>
    where
        R: AsyncRead + Unpin,
    {
        if self
            .inner
            .counter
            .is_at_capacity(self.inner.max_document_count)
        {
            tracing::warn!(
                "Rejecting document: {} of {} slots in use",
                self.inner.counter.get(),
                self.inner.max_document_count
            );
            return Err(AppError::CapacityExceeded);
        }

        let lifetime = options.lifetime.unwrap_or(self.inner.default_lifetime);
        let length = validate_name_length(
            options
                .name_length
                .unwrap_or(self.inner.default_name_length),
        )?;
        let alphabet = options
            .alphabet
            .as_ref()
            .unwrap_or(&self.inner.default_alphabet);

        let (name, file) = self.reserve(alphabet, length).await?;

        match self.write_payload(file, payload).await {
            Ok(0) => {
                self.discard(&name).await;
                Err(AppError::EmptyDocument)
            }
            Ok(written) => {
                self.schedule_deletion(&name, lifetime);
                tracing::info!(
                    "Stored document '{}' ({} bytes), expiring in {:?}",
                    name,
                    written,
                    lifetime
                );
                Ok(name)
            }
            Err(err) => {
                tracing::error!("Failed to write document '{}': {}", name, err);
                self.discard(&name).await;
                Err(AppError::Storage(err))
            }
        }
    }

    /// Allocate a free name and create its empty backing file.
    ///
    /// Both steps happen under the index lock, so the name is unique against
    /// every other creator by the time the lock is released.
    async fn reserve(
        &self,
        alphabet: &Alphabet,
        length: usize,
    ) -> Result<(String, File), AppError> {
        let mut names = self.inner.names.lock().await;
        loop {
            let name = allocate_name(alphabet, length, |candidate| {
                names.contains(candidate)
            })?;
            match open_reserved(&self.document_path(&name)).await {
                Ok(file) => {
                    names.insert(name.clone());
                    return Ok((name, file));
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    // Someone placed a file behind our back; adopt it like bootstrap does.
                    tracing::warn!("Adopting untracked document '{}'", name);
                    names.insert(name.clone());
                    self.schedule_deletion(&name, self.inner.default_lifetime);
                }
                Err(err) => {
                    tracing::error!("Failed to reserve document '{}': {}", name, err);
                    return Err(AppError::Storage(err));
                }
            }
        }
    }

    async fn write_payload<R>(&self, mut file: File, payload: R) -> std::io::Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut limited = payload.take(self.inner.max_document_size);
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        file.flush().await?;
        Ok(written)
    }

    /// Roll back a reservation.
    async fn discard(&self, name: &str) {
        if let Err(err) = fs::remove_file(self.document_path(name)).await {
            if err.kind() != ErrorKind::NotFound {
                tracing::error!("Failed to remove reservation '{}': {}", name, err);
            }
        }
        self.inner.names.lock().await.remove(name);
    }

    /// Open a document for streaming.
    ///
    /// Does not synchronize with in-flight creates.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown, expired or unaddressable
    /// names, and [`AppError::Storage`] for other I/O failures.
    pub async fn open(&self, name: &str) -> Result<File, AppError> {
        if !is_valid_document_name(name) {
            return Err(AppError::NotFound);
        }
        let path = self.document_path(name);
        let metadata = fs::metadata(&path).await.map_err(not_found_or_storage)?;
        if !metadata.is_file() {
            return Err(AppError::NotFound);
        }
        File::open(&path).await.map_err(not_found_or_storage)
    }

    /// Read a whole document into memory.
    ///
    /// # Errors
    /// Same as [`DocumentStore::open`].
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, AppError> {
        let mut file = self.open(name).await?;
        let mut payload = Vec::new();
        file.read_to_end(&mut payload).await?;
        Ok(payload)
    }

    /// Arm a one-shot deletion of `name` after `lifetime`.
    ///
    /// Counts the document as live until the deletion fires. Re-arming a name
    /// that already has a pending deletion replaces it without counting twice.
    /// Deletion is fire-and-forget: a missing file is not an error and
    /// nothing is retried.
    pub fn schedule_deletion(&self, name: &str, lifetime: Duration) {
        let store = Arc::downgrade(&self.inner);
        let key = name.to_string();
        // Count first: a zero lifetime may fire on another worker before `arm` returns.
        self.inner.counter.increment();
        let armed = self
            .inner
            .expiry
            .arm(name, lifetime, async move { expire(store, key).await });
        if armed == Armed::Replaced {
            self.inner.counter.decrement();
        }
    }

    /// Cancel every pending deletion, leaving documents on disk for the next start.
    ///
    /// # Returns
    /// The number of deletions cancelled.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inner.expiry.shutdown();
        tracing::info!("Cancelled {} pending expiry timer(s)", cancelled);
        cancelled
    }
}

async fn expire(store: Weak<StoreInner>, name: String) {
    let Some(inner) = store.upgrade() else {
        return;
    };
    match fs::remove_file(inner.root.join(&name)).await {
        Ok(()) => tracing::info!("Expired document '{}'", name),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!("Expired document '{}' was already gone", name)
        }
        Err(err) => tracing::debug!("Failed to delete expired document '{}': {}", name, err),
    }
    inner.names.lock().await.remove(&name);
    inner.counter.decrement();
}

fn not_found_or_storage(err: std::io::Error) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        AppError::NotFound
    } else {
        AppError::Storage(err)
    }
}

async fn create_root(root: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(root).await
}

async fn open_reserved(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}
