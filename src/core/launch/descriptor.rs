use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::core::auth::AuthenticationResult;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::memory::MemoryBounds;

/// Server the game joins right after start-up.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectTarget {
    pub const DEFAULT_PORT: u16 = 25565;

    /// Parse an optional `host[:port]`. Blank input means no autoconnect.
    pub fn parse_optional(raw: Option<&str>) -> LauncherResult<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

impl FromStr for ConnectTarget {
    type Err = LauncherError;

    /// Accepts `host`, `host:port`, `[v6]` and `[v6]:port`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        let invalid = || LauncherError::InvalidConnectTarget(raw.to_string());

        let (host, port) = if let Some(rest) = value.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, None),
                _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match value.split_once(':') {
                Some((_, port)) if port.contains(':') => return Err(invalid()),
                Some((host, port)) => (host, Some(port)),
                None => (value, None),
            }
        };

        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let port = match port {
            None => Self::DEFAULT_PORT,
            Some(digits) => match digits.parse::<u16>() {
                Ok(port) if port != 0 && digits.chars().all(|c| c.is_ascii_digit()) => port,
                _ => return Err(invalid()),
            },
        };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl std::fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Fully resolved launch parameters. Built fresh per attempt and handed
/// to the executor by value.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchDescriptor {
    pub root: PathBuf,
    pub version: String,
    pub memory: MemoryBounds,
    pub java_path: PathBuf,
    pub authorization: AuthenticationResult,
    /// Extra JVM arguments in order, e.g. the authlib agent.
    pub custom_args: Vec<String>,
    pub connect: Option<ConnectTarget>,
}

impl LaunchDescriptor {
    /// Heap flags followed by the custom arguments.
    pub fn jvm_arguments(&self) -> Vec<String> {
        let mut args = vec![
            format!("-Xmx{}M", self.memory.max),
            format!("-Xms{}M", self.memory.min),
        ];
        args.extend(self.custom_args.iter().cloned());
        args
    }

    /// Autoconnect flags understood by the game client.
    pub fn game_arguments(&self) -> Vec<String> {
        match &self.connect {
            Some(target) => vec![
                "--server".into(),
                target.host.clone(),
                "--port".into(),
                target.port.to_string(),
            ],
            None => Vec::new(),
        }
    }
}
