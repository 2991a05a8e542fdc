// ─── Remote Launcher Config ───
// Announcement/config document published by the server operators.

mod status;

use serde::Deserialize;
use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::http::fetch_body;
use crate::core::update::UpdateDescriptor;

pub use status::{PlayerCount, ServerStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteLauncherConfig {
    #[serde(default)]
    pub news: Option<News>,
    /// Address polled for the online/player count badge.
    #[serde(default)]
    pub server_status_ip: Option<String>,
    /// Older documents only carry this field.
    #[serde(default)]
    pub server_ip: Option<String>,
    #[serde(default)]
    pub game_connect: Option<GameConnect>,
    #[serde(default)]
    pub modpack: Option<ModpackInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct News {
    pub title: String,
    #[serde(default)]
    pub items: Vec<NewsItem>,
}

/// A bare line of text or a link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NewsItem {
    Text(String),
    Link {
        text: String,
        #[serde(default)]
        url: Option<String>,
    },
}

impl NewsItem {
    pub fn text(&self) -> &str {
        match self {
            NewsItem::Text(text) | NewsItem::Link { text, .. } => text,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            NewsItem::Text(_) => None,
            NewsItem::Link { url, .. } => url.as_deref().filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConnect {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModpackInfo {
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub delete: Option<Vec<String>>,
}

impl RemoteLauncherConfig {
    /// Fetch the document, bounded by `timeout`.
    pub async fn fetch(
        client: &reqwest::Client,
        url: &str,
        timeout: std::time::Duration,
    ) -> LauncherResult<Self> {
        info!("Fetching remote launcher config from {}", url);

        let body = fetch_body(client.get(url).timeout(timeout), url).await?;
        let config: RemoteLauncherConfig = serde_json::from_slice(&body)?;

        info!(
            "Remote config loaded (modpack: {:?})",
            config.modpack.as_ref().map(|m| m.version.as_str())
        );
        Ok(config)
    }

    pub fn modpack_update(&self) -> Option<UpdateDescriptor> {
        self.modpack.as_ref().map(|modpack| UpdateDescriptor {
            url: modpack.url.clone(),
            version: modpack.version.clone(),
            delete_list: modpack.delete.clone().unwrap_or_default(),
        })
    }

    /// Direct-connect address, only when the operators enabled it.
    pub fn autoconnect_target(&self) -> Option<&str> {
        self.game_connect
            .as_ref()
            .filter(|connect| connect.enable)
            .and_then(|connect| connect.ip.as_deref())
            .filter(|ip| !ip.trim().is_empty())
    }

    /// Address to poll for the status badge.
    pub fn status_address(&self) -> Option<&str> {
        self.server_status_ip
            .as_deref()
            .filter(|ip| !ip.trim().is_empty())
            .or(self.server_ip.as_deref())
            .filter(|ip| !ip.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LauncherError;
    use crate::core::http::tests::{local_client, serve_once, silent_server};
    use std::time::Duration;

    const DOCUMENT: &str = r#"{
        "news": {
            "title": "Season 3",
            "items": ["Server reset on Friday", { "text": "Rules", "url": "https://example.com/rules" }]
        },
        "server_status_ip": "status.example.com",
        "server_ip": "legacy.example.com",
        "game_connect": { "enable": true, "ip": "play.example.com:25566" },
        "modpack": {
            "url": "https://cdn.example.com/pack-1.1.0.zip",
            "version": "1.1.0",
            "note": "New mods",
            "delete": ["mods/old.jar"]
        }
    }"#;

    #[test]
    fn parses_full_document() {
        let config: RemoteLauncherConfig = serde_json::from_str(DOCUMENT).unwrap();
        let news = config.news.as_ref().unwrap();
        assert_eq!(news.items[0].text(), "Server reset on Friday");
        assert_eq!(news.items[0].url(), None);
        assert_eq!(news.items[1].url(), Some("https://example.com/rules"));
        assert_eq!(config.status_address(), Some("status.example.com"));
        assert_eq!(config.autoconnect_target(), Some("play.example.com:25566"));

        let update = config.modpack_update().unwrap();
        assert_eq!(update.version, "1.1.0");
        assert_eq!(update.delete_list, vec!["mods/old.jar".to_string()]);
    }

    #[test]
    fn disabled_connect_and_legacy_status() {
        let config: RemoteLauncherConfig = serde_json::from_str(
            r#"{ "server_ip": "legacy.example.com", "game_connect": { "enable": false, "ip": "x" } }"#,
        )
        .unwrap();
        assert_eq!(config.autoconnect_target(), None);
        assert_eq!(config.status_address(), Some("legacy.example.com"));
        assert!(config.modpack_update().is_none());
    }

    #[tokio::test]
    async fn fetch_parses_the_served_document() {
        let url = serve_once("200 OK", DOCUMENT).await;
        let config = RemoteLauncherConfig::fetch(&local_client(), &url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(config.modpack_update().unwrap().version, "1.1.0");
    }

    #[tokio::test]
    async fn unresponsive_server_is_a_download_error() {
        let url = silent_server().await;
        let err = RemoteLauncherConfig::fetch(&local_client(), &url, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_download_error(), "{err:?}");
    }

    #[tokio::test]
    async fn malformed_document_is_a_json_error() {
        let url = serve_once("200 OK", "<html>maintenance</html>").await;
        let err = RemoteLauncherConfig::fetch(&local_client(), &url, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Json(_)));
    }
}
