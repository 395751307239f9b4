//! HTTP request handlers.

/// Document upload and download endpoints.
pub mod document;
pub(crate) mod headers;
