use std::{path::Path, time::Duration};

use async_trait::async_trait;

use crate::{errors::Error, media::mime::resolve_content_type, Result};

/// Bytes loaded for one outbound media send. Never shared across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Loads media referenced by an outbound send.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, source: &str, max_bytes: u64) -> Result<FetchedMedia>;
}

/// Fetches `http(s)://` URLs with reqwest; `file://` URLs and plain paths are read from disk.
#[derive(Clone, Debug)]
pub struct HttpMediaFetcher {
    http: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch_http(&self, url: &str, max_bytes: u64) -> Result<FetchedMedia> {
        let mut resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MediaFetch(format!("{url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::MediaFetch(format!(
                "{url}: HTTP {}",
                resp.status()
            )));
        }
        if resp.content_length().is_some_and(|len| len > max_bytes) {
            return Err(Error::MediaTooLarge { limit: max_bytes });
        }

        let declared = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let file_name = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .or_else(|| file_name_from_url(resp.url().path()));

        let mut bytes = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| Error::MediaFetch(format!("{url}: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > max_bytes {
                return Err(Error::MediaTooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        let content_type = resolve_content_type(declared.as_deref(), &bytes, file_name.as_deref());
        Ok(FetchedMedia {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn fetch_local(&self, path: &Path, max_bytes: u64) -> Result<FetchedMedia> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::MediaFetch(format!("{}: {e}", path.display())))?;
        if meta.len() > max_bytes {
            return Err(Error::MediaTooLarge { limit: max_bytes });
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string);
        let content_type = resolve_content_type(None, &bytes, file_name.as_deref());
        Ok(FetchedMedia {
            bytes,
            content_type,
            file_name,
        })
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, source: &str, max_bytes: u64) -> Result<FetchedMedia> {
        let source = source.trim();
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return self.fetch_http(source, max_bytes).await;
        }
        let path = source.strip_prefix("file://").unwrap_or(source);
        self.fetch_local(Path::new(path), max_bytes).await
    }
}

fn file_name_from_url(path: &str) -> Option<String> {
    let last = path.rsplit('/').next()?.trim();
    if last.is_empty() || !last.contains('.') {
        return None;
    }
    Some(last.to_string())
}

fn file_name_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
