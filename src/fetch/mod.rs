//! Loading survey exports from a local path or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::debug;

use crate::config::ColumnMapping;
use crate::error::SurveyError;
use crate::parser::{Dataset, parse_responses};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, SurveyError> {
    let fetch_err = |reason: String| SurveyError::Fetch {
        url: url.to_string(),
        reason,
    };

    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse::<reqwest::Url>()
            .map_err(|e| fetch_err(e.to_string()))?,
    );

    let resp = client
        .execute(req)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_err(e.to_string()))?;
    let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Reads the raw bytes of `source`, which is either an `http(s)` URL or a
/// local file path.
#[tracing::instrument(skip(client))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>, SurveyError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return fetch_bytes(client, source).await;
    }

    let bytes = tokio::fs::read(source).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SurveyError::MissingFile {
            path: source.to_string(),
        },
        _ => SurveyError::UnreadableFile {
            source_name: source.to_string(),
            reason: e.to_string(),
        },
    })?;
    debug!(bytes = bytes.len(), "Source read from disk");
    Ok(bytes)
}

/// Reads and parses `source` into a [`Dataset`].
pub async fn load_dataset<C: HttpClient>(
    client: &C,
    source: &str,
    columns: &ColumnMapping,
) -> Result<Dataset, SurveyError> {
    let bytes = read_source(client, source).await?;
    parse_responses(&bytes, columns, source)
}
