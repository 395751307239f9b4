//! Random document names drawn from a caller-chosen alphabet.
//!
//! Allocation is attempt-bounded: a request makes at most `|alphabet|^length`
//! random draws. Small name spaces are then enumerated from a random offset,
//! so a name space with a single free slot still yields it. Only when every
//! name is taken does allocation report [`AppError::NameSpaceExhausted`].

use crate::constants::{MAX_NAME_LENGTH, NAME_ENUMERATION_LIMIT};
use crate::error::AppError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// A validated, de-duplicated set of characters names are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from a charset string.
    ///
    /// Repeated characters are dropped (first occurrence wins) so that every
    /// distinct character is drawn with equal probability.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when the charset is empty or contains
    /// a path separator, NUL, or a control character.
    pub fn new(charset: &str) -> Result<Self, AppError> {
        let mut chars: Vec<char> = Vec::with_capacity(charset.len());
        for ch in charset.chars() {
            if ch == '/' || ch == '\\' || ch.is_control() {
                return Err(AppError::BadRequest(format!(
                    "name charset may not contain {:?}",
                    ch
                )));
            }
            if !chars.contains(&ch) {
                chars.push(ch);
            }
        }
        if chars.is_empty() {
            return Err(AppError::BadRequest(
                "name charset must not be empty".to_string(),
            ));
        }
        Ok(Self { chars })
    }

    /// Number of distinct characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always `false`; construction rejects empty alphabets.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Number of distinct names of `length` characters, saturating at `u64::MAX`.
    pub fn name_space_size(&self, length: usize) -> u64 {
        let base = self.chars.len() as u64;
        let mut size: u64 = 1;
        for _ in 0..length {
            size = size.saturating_mul(base);
            if size == u64::MAX {
                break;
            }
        }
        size
    }

    fn nth_name(&self, mut index: u64, length: usize) -> String {
        let base = self.chars.len() as u64;
        let mut name = String::with_capacity(length);
        for _ in 0..length {
            name.push(self.chars[(index % base) as usize]);
            index /= base;
        }
        name
    }
}

impl FromStr for Alphabet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.chars {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

/// Check a requested name length.
///
/// # Errors
/// Returns [`AppError::BadRequest`] unless `1 <= length <= MAX_NAME_LENGTH`.
pub fn validate_name_length(length: usize) -> Result<usize, AppError> {
    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name length must be between 1 and {}",
            MAX_NAME_LENGTH
        )));
    }
    Ok(length)
}

/// Whether `name` can address a document: a single, non-special path component.
pub fn is_valid_document_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|ch| ch == '/' || ch == '\\' || ch.is_control())
}

/// Draw one candidate name uniformly at random, with replacement.
pub fn generate_name<R: Rng + ?Sized>(
    rng: &mut R,
    alphabet: &Alphabet,
    length: usize,
) -> String {
    (0..length)
        .map(|_| alphabet.chars[rng.gen_range(0..alphabet.chars.len())])
        .collect()
}

/// Allocate a name that `exists_check` reports as free.
///
/// Must be called while holding whatever lock protects the set that
/// `exists_check` consults.
///
/// # Errors
/// Returns [`AppError::NameSpaceExhausted`] when no free name was found.
pub fn allocate_name<F>(
    alphabet: &Alphabet,
    length: usize,
    exists_check: F,
) -> Result<String, AppError>
where
    F: Fn(&str) -> bool,
{
    allocate_name_with_rng(&mut rand::thread_rng(), alphabet, length, exists_check)
}

/// [`allocate_name`] with an explicit random source.
///
/// # Errors
/// Returns [`AppError::NameSpaceExhausted`] when no free name was found.
pub fn allocate_name_with_rng<R, F>(
    rng: &mut R,
    alphabet: &Alphabet,
    length: usize,
    exists_check: F,
) -> Result<String, AppError>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let is_taken = |name: &str| !is_valid_document_name(name) || exists_check(name);
    let space = alphabet.name_space_size(length);

    for _ in 0..space {
        let candidate = generate_name(rng, alphabet, length);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    if space <= NAME_ENUMERATION_LIMIT {
        let offset = rng.gen_range(0..space);
        for step in 0..space {
            let candidate = alphabet.nth_name((offset + step) % space, length);
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
        }
    }

    Err(AppError::NameSpaceExhausted)
}
