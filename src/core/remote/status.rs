// ─── Server Status ───
// Online state and player count of the game server, from a
// mcsrvstat-style HTTP API: `GET {api}/{address}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::error::LauncherResult;
use crate::core::http::fetch_body;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerCount {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub max: u32,
}

/// An offline server reports `{"online": false}` without players.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub players: PlayerCount,
    #[serde(default)]
    pub version: Option<String>,
}

impl ServerStatus {
    /// Query `api_base` for `address`, bounded by `timeout`. A timeout is a
    /// `Download` error; callers usually show the server as offline.
    #[instrument(skip(client, timeout))]
    pub async fn fetch(
        client: &reqwest::Client,
        api_base: &str,
        address: &str,
        timeout: Duration,
    ) -> LauncherResult<Self> {
        let url = format!("{}/{}", api_base.trim_end_matches('/'), address.trim());
        let body = fetch_body(client.get(&url).timeout(timeout), &url).await?;
        let status: ServerStatus = serde_json::from_slice(&body)?;
        debug!("Server {} status: {}", address, status);
        Ok(status)
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.online {
            write!(f, "online ({}/{})", self.players.online, self.players.max)
        } else {
            f.write_str("offline")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::tests::{local_client, serve_once, silent_server};

    #[test]
    fn parses_online_payload() {
        let status: ServerStatus = serde_json::from_str(
            r#"{
                "online": true,
                "ip": "203.0.113.7",
                "port": 25565,
                "version": "1.12.2",
                "players": { "online": 3, "max": 20, "list": [{ "name": "Steve" }] }
            }"#,
        )
        .unwrap();
        assert!(status.online);
        assert_eq!(status.players, PlayerCount { online: 3, max: 20 });
        assert_eq!(status.version.as_deref(), Some("1.12.2"));
        assert_eq!(status.to_string(), "online (3/20)");
    }

    #[test]
    fn offline_payload_has_no_players() {
        let status: ServerStatus =
            serde_json::from_str(r#"{ "online": false, "ip": "", "port": 25565 }"#).unwrap();
        assert_eq!(status, ServerStatus::default());
        assert_eq!(status.to_string(), "offline");
    }

    #[tokio::test]
    async fn fetches_from_the_status_api() {
        let api = serve_once("200 OK", r#"{"online":true,"players":{"online":1,"max":10}}"#).await;
        let status = ServerStatus::fetch(
            &local_client(),
            &format!("{api}/3/"),
            "play.example.com",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(status.players.max, 10);
    }

    #[tokio::test]
    async fn slow_status_api_times_out() {
        let api = silent_server().await;
        let err = ServerStatus::fetch(
            &local_client(),
            &api,
            "play.example.com",
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
        assert!(err.is_download_error(), "{err:?}");
    }
}
