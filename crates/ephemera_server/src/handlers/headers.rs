//! Per-request overrides carried in `Doc-*` headers.

use crate::AppError;
use axum::http::HeaderMap;
use ephemera_core::duration::parse_lifetime;
use ephemera_core::{
    Alphabet, CreateOptions, LIFETIME_HEADER, NAME_CHARSET_HEADER, NAME_LENGTH_HEADER,
};

/// Non-empty UTF-8 value of `name`, if present.
fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(value.as_bytes())
        .map_err(|_| AppError::BadRequest(format!("{} is not valid UTF-8", name)))?;
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(text))
}

/// Build [`CreateOptions`] from request headers; absent headers keep the defaults.
pub(crate) fn create_options(headers: &HeaderMap) -> Result<CreateOptions, AppError> {
    let lifetime = header_text(headers, LIFETIME_HEADER)?
        .map(parse_lifetime)
        .transpose()?;
    let alphabet = header_text(headers, NAME_CHARSET_HEADER)?
        .map(Alphabet::new)
        .transpose()?;
    let name_length = header_text(headers, NAME_LENGTH_HEADER)?
        .map(|value| {
            value.trim().parse::<usize>().map_err(|_| {
                AppError::BadRequest(format!("invalid name length '{}'", value))
            })
        })
        .transpose()?;

    Ok(CreateOptions {
        lifetime,
        alphabet,
        name_length,
    })
}
