//! Core library for ephemera (config, naming, and the document lifecycle).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Lifetime parsing in Go duration syntax.
pub mod duration;
/// Application error types.
pub mod error;
/// Random document name allocation.
pub mod naming;
/// Document storage, admission control and expiry.
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::*;
pub use error::AppError;
pub use naming::Alphabet;
pub use store::{CreateOptions, DocumentStore};
