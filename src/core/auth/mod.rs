// ─── Authentication ───
// Yggdrasil-compatible login against an external skin/auth server.

use md5::{Digest, Md5};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    Offline,
    Yggdrasil,
}

/// Credentials handed to the game. Treated as an opaque value once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticationResult {
    pub mode: AccountMode,
    pub access_token: String,
    pub client_token: String,
    /// Profile UUID without dashes.
    pub uuid: String,
    pub name: String,
    pub user_properties: serde_json::Value,
    pub user_type: String,
}

impl AuthenticationResult {
    /// Offline profile with the UUID the game derives for
    /// `OfflinePlayer:<name>`.
    pub fn offline(username: &str) -> Self {
        let name = match username.trim() {
            "" => "Player",
            trimmed => trimmed,
        };
        Self {
            mode: AccountMode::Offline,
            access_token: Uuid::new_v4().simple().to_string(),
            client_token: Uuid::new_v4().simple().to_string(),
            uuid: offline_uuid(name).simple().to_string(),
            name: name.to_string(),
            user_properties: serde_json::json!({}),
            user_type: "legacy".into(),
        }
    }
}

/// Name-based (MD5, version 3) UUID over `OfflinePlayer:<name>`.
pub fn offline_uuid(name: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{name}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

// ── Wire format ─────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    agent: Agent,
    username: &'a str,
    password: &'a str,
    client_token: &'a str,
    request_user: bool,
}

#[derive(Debug, Serialize)]
struct Agent {
    name: &'static str,
    version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateResponse {
    access_token: String,
    client_token: String,
    selected_profile: Option<Profile>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    properties: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerError {
    error_message: Option<String>,
    error: Option<String>,
}

/// Login client for a Yggdrasil API root such as
/// `https://example.com/api/yggdrasil`.
pub struct YggdrasilClient {
    client: Client,
    timeout: std::time::Duration,
}

impl YggdrasilClient {
    pub fn new(client: Client, timeout: std::time::Duration) -> Self {
        Self { client, timeout }
    }

    /// Exchange username/password for an `AuthenticationResult`.
    ///
    /// A rejection reported by the server becomes `AuthServer` with the
    /// server's message; anything below HTTP stays `Http`.
    #[instrument(skip(self, password, client_token))]
    pub async fn authenticate(
        &self,
        auth_server: &str,
        username: &str,
        password: &str,
        client_token: &str,
    ) -> LauncherResult<AuthenticationResult> {
        let url = format!("{}/authserver/authenticate", auth_server.trim_end_matches('/'));
        info!("Requesting login at {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&AuthenticateRequest {
                agent: Agent {
                    name: "Minecraft",
                    version: 1,
                },
                username,
                password,
                client_token,
                request_user: true,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = server_error_message(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!("Login rejected by {}: {}", auth_server, message);
            return Err(LauncherError::AuthServer { message });
        }

        let parsed: AuthenticateResponse = serde_json::from_slice(&body)?;
        let profile = parsed.selected_profile.ok_or_else(|| LauncherError::AuthServer {
            message: "account has no game profile selected".into(),
        })?;

        info!("Logged in as {}", profile.name);
        Ok(AuthenticationResult {
            mode: AccountMode::Yggdrasil,
            access_token: parsed.access_token,
            client_token: parsed.client_token,
            uuid: profile.id,
            name: profile.name,
            user_properties: parsed
                .user
                .map(|user| user.properties)
                .unwrap_or_else(|| serde_json::json!({})),
            user_type: "mojang".into(),
        })
    }
}

fn server_error_message(body: &[u8]) -> Option<String> {
    let parsed: ServerError = serde_json::from_slice(body).ok()?;
    parsed
        .error_message
        .filter(|m| !m.trim().is_empty())
        .or(parsed.error)
}
