use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::core::config::NetworkPolicy;
use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = concat!("ModpackLauncher/", env!("CARGO_PKG_VERSION"));

/// Shared client for every outbound request. Only the connect phase is
/// bounded here: archive downloads are bounded per chunk and JSON calls
/// set their own whole-request timeout.
pub fn build_http_client(network: &NetworkPolicy) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(network.connect_timeout())
        .build()
}

/// Send `request` and read the whole body.
///
/// Transport errors and timeouts become `Download`, a non-success status
/// becomes `DownloadFailed`, so callers can treat a dead remote the same
/// way as a failed archive download.
pub(crate) async fn fetch_body(request: RequestBuilder, url: &str) -> LauncherResult<Bytes> {
    let transfer = |e: reqwest::Error| LauncherError::Download {
        url: url.to_string(),
        reason: if e.is_timeout() {
            "request timed out".to_string()
        } else {
            e.to_string()
        },
    };

    let response = request.send().await.map_err(transfer)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await.map_err(transfer)?;
    debug!("Fetched {} ({} bytes)", url, body.len());
    Ok(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Client that ignores proxy settings from the environment.
    pub(crate) fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Accepts connections and never answers.
    pub(crate) async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    /// Answers a single request with `status` and a JSON `body`.
    pub(crate) async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn unanswered_request_times_out_as_download_error() {
        let url = silent_server().await;
        let err = fetch_body(
            local_client().get(&url).timeout(Duration::from_millis(200)),
            &url,
        )
        .await
        .unwrap_err();

        assert!(err.is_download_error(), "{err:?}");
        assert!(matches!(err, LauncherError::Download { ref reason, .. } if reason.contains("timed out")));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let err = fetch_body(local_client().get(&url), &url).await.unwrap_err();
        assert!(matches!(err, LauncherError::DownloadFailed { status: 503, .. }));
    }

    #[tokio::test]
    async fn body_is_returned() {
        let url = serve_once("200 OK", r#"{"ok":true}"#).await;
        let body = fetch_body(local_client().get(&url), &url).await.unwrap();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }
}
