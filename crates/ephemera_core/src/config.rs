//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_DOC_ROOT, DEFAULT_LIFETIME, DEFAULT_MAX_DOCUMENT_COUNT,
    DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_NAME_CHARSET, DEFAULT_NAME_LENGTH,
};
use crate::duration::parse_lifetime;
use crate::error::AppError;
use crate::naming::{validate_name_length, Alphabet};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Listen address override.
pub const ENV_BIND: &str = "BIND";
/// Document root directory.
pub const ENV_DOC_ROOT: &str = "DOC_ROOT";
/// Maximum stored bytes per document.
pub const ENV_MAX_DOC_SIZE: &str = "MAX_DOC_SIZE";
/// Maximum number of live documents.
pub const ENV_MAX_DOC_COUNT: &str = "MAX_DOC_COUNT";
/// Default document lifetime, Go duration syntax.
pub const ENV_DOC_LIFETIME: &str = "DOC_LIFETIME";
/// Default generated name length.
pub const ENV_DOC_NAME_LENGTH: &str = "DOC_NAME_LENGTH";
/// Default generated name charset.
pub const ENV_DOC_NAME_CHARSET: &str = "DOC_NAME_CHARSET";

/// Runtime configuration for the document server.
///
/// Loaded once at startup and shared read-only for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub doc_root: PathBuf,
    pub max_document_size: u64,
    pub max_document_count: usize,
    pub default_lifetime: Duration,
    pub default_name_length: usize,
    pub default_name_charset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 1488)),
            doc_root: PathBuf::from(DEFAULT_DOC_ROOT),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_document_count: DEFAULT_MAX_DOCUMENT_COUNT,
            default_lifetime: DEFAULT_LIFETIME,
            default_name_length: DEFAULT_NAME_LENGTH,
            default_name_charset: DEFAULT_NAME_CHARSET.to_string(),
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows USERPROFILE
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

fn parse_or_default<T, E, P>(key: &str, raw: Option<String>, parse: P, default: T) -> T
where
    P: FnOnce(&str) -> Result<T, E>,
    E: Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match parse(raw.trim()) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("Invalid {}='{}': {}. Using default", key, raw, err);
            default
        }
    }
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, T::Err> {
    value.parse()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Arguments
    /// - `lookup`: Returns the raw value for a variable name, if set.
    ///
    /// # Returns
    /// A populated [`Config`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            listen_addr: parse_or_default(
                ENV_BIND,
                lookup(ENV_BIND),
                parse_number::<SocketAddr>,
                defaults.listen_addr,
            ),
            doc_root: lookup(ENV_DOC_ROOT)
                .filter(|root| !root.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or(defaults.doc_root),
            max_document_size: parse_or_default(
                ENV_MAX_DOC_SIZE,
                lookup(ENV_MAX_DOC_SIZE),
                parse_number::<u64>,
                defaults.max_document_size,
            ),
            max_document_count: parse_or_default(
                ENV_MAX_DOC_COUNT,
                lookup(ENV_MAX_DOC_COUNT),
                parse_number::<usize>,
                defaults.max_document_count,
            ),
            default_lifetime: parse_or_default(
                ENV_DOC_LIFETIME,
                lookup(ENV_DOC_LIFETIME),
                parse_lifetime,
                defaults.default_lifetime,
            ),
            default_name_length: parse_or_default(
                ENV_DOC_NAME_LENGTH,
                lookup(ENV_DOC_NAME_LENGTH),
                parse_number::<usize>,
                defaults.default_name_length,
            ),
            default_name_charset: lookup(ENV_DOC_NAME_CHARSET)
                .filter(|charset| !charset.is_empty())
                .unwrap_or(defaults.default_name_charset),
        }
    }

    /// Check that the configured defaults can actually serve requests.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for a zero size cap, an out-of-range
    /// default name length, or an invalid default charset.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_document_size == 0 {
            return Err(AppError::BadRequest(
                "maximum document size must be positive".to_string(),
            ));
        }
        validate_name_length(self.default_name_length)?;
        self.default_alphabet()?;
        Ok(())
    }

    /// Parse the default name charset.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] if the charset is not a valid alphabet.
    pub fn default_alphabet(&self) -> Result<Alphabet, AppError> {
        Alphabet::new(&self.default_name_charset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_BIND;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.listen_addr.to_string(), DEFAULT_BIND);
        assert_eq!(config.default_lifetime, Duration::from_secs(168 * 3600));
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_DOC_ROOT, "/srv/docs"),
            (ENV_MAX_DOC_SIZE, "1024"),
            (ENV_MAX_DOC_COUNT, "3"),
            (ENV_DOC_LIFETIME, "1h30m"),
            (ENV_DOC_NAME_LENGTH, "4"),
            (ENV_DOC_NAME_CHARSET, "xyz"),
        ]));
        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.doc_root, PathBuf::from("/srv/docs"));
        assert_eq!(config.max_document_size, 1024);
        assert_eq!(config.max_document_count, 3);
        assert_eq!(config.default_lifetime, Duration::from_secs(5400));
        assert_eq!(config.default_name_length, 4);
        assert_eq!(config.default_name_charset, "xyz");
        config.validate().expect("valid config");
    }

    #[test]
    fn unparsable_variables_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_BIND, "bad:host"),
            (ENV_MAX_DOC_SIZE, "lots"),
            (ENV_DOC_LIFETIME, "forever"),
            (ENV_DOC_NAME_LENGTH, "-2"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn validate_rejects_unusable_defaults() {
        let zero_size = Config {
            max_document_size: 0,
            ..Config::default()
        };
        assert!(zero_size.validate().is_err());

        let zero_length = Config {
            default_name_length: 0,
            ..Config::default()
        };
        assert!(zero_length.validate().is_err());

        let bad_charset = Config {
            default_name_charset: "a/b".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            bad_charset.validate(),
            Err(AppError::BadRequest(_))
        ));
    }
}
