//! Document HTTP handlers.

use super::headers::create_options;
use crate::{error::HttpError, AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use std::io;
use tokio_util::io::{ReaderStream, StreamReader};

/// Usage banner with the server's defaults, doubling as a liveness probe.
pub async fn usage(State(state): State<AppState>) -> String {
    let config = &state.config;
    format!(
        "ephemera: anonymous, self-expiring documents\n\n\
         POST /        upload the request body; responds with the document name\n\
         GET  /{{name}}  download a document until it expires\n\n\
         Optional upload headers:\n\
         \x20 Doc-Lifetime      lifetime such as 168h or 1h30m (default {:?})\n\
         \x20 Doc-Name-Charset  characters names are drawn from (default {})\n\
         \x20 Doc-Name-Length   number of characters in the name (default {})\n",
        config.default_lifetime, config.default_name_charset, config.default_name_length
    )
}

/// Store the request body as a new document.
///
/// # Returns
/// The generated name as plain text.
///
/// # Errors
/// Returns an error if a `Doc-*` header is malformed, the store is full,
/// the body is empty, or storage fails.
pub async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, HttpError> {
    let options = create_options(&headers)?;
    let stream = body
        .into_data_stream()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err));
    let name = state.store.create(StreamReader::new(stream), options).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        name,
    )
        .into_response())
}

/// Stream a stored document.
///
/// # Errors
/// Returns an error if the document does not exist, has expired, or cannot
/// be opened.
pub async fn get_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, HttpError> {
    let file = state.store.open(&name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response())
}
