// ─── Launch Configurator ───
// Validates preconditions and composes a LaunchDescriptor. Spawns nothing.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::descriptor::{ConnectTarget, LaunchDescriptor};
use crate::core::auth::AuthenticationResult;
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::installation::{resolve_version, InstallationTree};
use crate::core::java;
use crate::core::memory::{self, parse_memory_mb, MemoryBounds};

/// Caller-supplied inputs for one launch attempt.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Known-good version id; skips the resolver when set.
    pub version_override: Option<String>,
    /// Raw heap override, e.g. `"4096"` or `"4G"`.
    pub memory_override: Option<String>,
    pub java_path_override: Option<PathBuf>,
    pub authorization: AuthenticationResult,
    pub auth_server: String,
    /// `host[:port]` to join on start-up.
    pub connect_target: Option<String>,
}

impl LaunchRequest {
    pub fn new(authorization: AuthenticationResult, auth_server: impl Into<String>) -> Self {
        Self {
            version_override: None,
            memory_override: None,
            java_path_override: None,
            authorization,
            auth_server: auth_server.into(),
            connect_target: None,
        }
    }
}

/// Degraded-but-launchable conditions found while configuring.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchWarning {
    /// No authlib agent: logins against third-party servers will fail.
    AuthlibMissing { path: PathBuf },
    /// Heap override could not be parsed; the computed bounds were used.
    MemoryOverrideIgnored { raw: String },
}

impl std::fmt::Display for LaunchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchWarning::AuthlibMissing { path } => write!(
                f,
                "authlib-injector not found at {}; third-party servers will reject the session",
                path.display()
            ),
            LaunchWarning::MemoryOverrideIgnored { raw } => {
                write!(f, "ignoring memory setting '{raw}', using automatic sizing")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub descriptor: LaunchDescriptor,
    pub warnings: Vec<LaunchWarning>,
}

pub struct LaunchConfigurator<'a> {
    config: &'a LauncherConfig,
    host_total_bytes: u64,
}

impl<'a> LaunchConfigurator<'a> {
    /// Configurator sized for this machine's memory.
    pub fn new(config: &'a LauncherConfig) -> Self {
        Self::with_host_memory(config, memory::host_total_memory_bytes())
    }

    pub fn with_host_memory(config: &'a LauncherConfig, host_total_bytes: u64) -> Self {
        Self {
            config,
            host_total_bytes,
        }
    }

    pub async fn configure(
        &self,
        tree: &InstallationTree,
        request: LaunchRequest,
    ) -> LauncherResult<LaunchPlan> {
        let mut warnings = Vec::new();

        // Version
        let version = match request.version_override.filter(|v| !v.trim().is_empty()) {
            Some(version) => version,
            None => resolve_version(tree).await?,
        };

        // Java
        let java_path = request
            .java_path_override
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| java::bundled_java_path(&self.config.resources_dir));
        if !tokio::fs::try_exists(&java_path).await.unwrap_or(false) {
            return Err(LauncherError::JavaNotFound(java_path));
        }

        // Memory
        let memory = match request.memory_override.as_deref().map(str::trim) {
            None | Some("") => self.computed_memory(),
            Some(raw) => match parse_memory_mb(raw) {
                Some(max_mb) => MemoryBounds::from_override(max_mb, &self.config.memory),
                None => {
                    warn!("Malformed memory override {:?}", raw);
                    warnings.push(LaunchWarning::MemoryOverrideIgnored {
                        raw: raw.to_string(),
                    });
                    self.computed_memory()
                }
            },
        };

        // Authentication proxy
        let mut custom_args = Vec::new();
        let agent = java::authlib_injector_path(&self.config.resources_dir);
        if tokio::fs::try_exists(&agent).await.unwrap_or(false) {
            debug!("Injecting authlib-injector for {}", request.auth_server);
            custom_args.push(java::authlib_agent_argument(&agent, &request.auth_server));
        } else {
            warn!("authlib-injector missing at {:?}", agent);
            warnings.push(LaunchWarning::AuthlibMissing { path: agent });
        }

        // Autoconnect
        let connect = ConnectTarget::parse_optional(request.connect_target.as_deref())?;

        info!(
            "Launch configured: version={} java={:?} memory={}-{}M connect={:?}",
            version, java_path, memory.min, memory.max, connect
        );

        Ok(LaunchPlan {
            descriptor: LaunchDescriptor {
                root: tree.root().to_path_buf(),
                version,
                memory,
                java_path,
                authorization: request.authorization,
                custom_args,
                connect,
            },
            warnings,
        })
    }

    fn computed_memory(&self) -> MemoryBounds {
        MemoryBounds::for_host_bytes(self.host_total_bytes, &self.config.memory)
    }
}
