// ─── Archive Source ───
// Transport seam for the download phase.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::Client;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// An opened archive download: optional size plus the body chunks.
pub struct ArchiveStream {
    pub content_length: Option<u64>,
    pub chunks: BoxStream<'static, LauncherResult<Bytes>>,
}

#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Start fetching `url`. A non-success response is an error.
    async fn open(&self, url: &str) -> LauncherResult<ArchiveStream>;
}

/// HTTP(S) source backed by the shared `reqwest` client.
pub struct HttpArchiveSource {
    client: Client,
}

impl HttpArchiveSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArchiveSource for HttpArchiveSource {
    async fn open(&self, url: &str) -> LauncherResult<ArchiveStream> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LauncherError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        debug!("Opened {} (content-length: {:?})", url, content_length);

        let owned_url = url.to_string();
        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| LauncherError::Download {
                    url: owned_url.clone(),
                    reason: e.to_string(),
                })
            })
            .boxed();

        Ok(ArchiveStream {
            content_length,
            chunks,
        })
    }
}
