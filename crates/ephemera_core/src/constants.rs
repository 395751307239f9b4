//! Shared constants used across ephemera crates.

use std::time::Duration;

/// Default listen address for the document server.
pub const DEFAULT_BIND: &str = "127.0.0.1:1488";

/// Default document root, relative to the working directory.
pub const DEFAULT_DOC_ROOT: &str = "docs";

/// Default cap on bytes stored per document.
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 10_000_000;

/// Default cap on the number of live documents.
pub const DEFAULT_MAX_DOCUMENT_COUNT: usize = 2000;

/// Default document lifetime (one week).
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default generated name length.
pub const DEFAULT_NAME_LENGTH: usize = 9;

/// Default alphabet generated names are drawn from.
pub const DEFAULT_NAME_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Longest name a client may request.
pub const MAX_NAME_LENGTH: usize = 128;

/// Name spaces up to this size are enumerated once random draws are used up.
pub const NAME_ENUMERATION_LIMIT: u64 = 65_536;

/// Request header overriding the document lifetime.
pub const LIFETIME_HEADER: &str = "doc-lifetime";
/// Request header overriding the name alphabet.
pub const NAME_CHARSET_HEADER: &str = "doc-name-charset";
/// Request header overriding the name length.
pub const NAME_LENGTH_HEADER: &str = "doc-name-length";

/// Default server URL for the `epb` client.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://127.0.0.1:1488";
