// ─── Launcher Configuration ───
// Immutable configuration built once at startup and shared by reference,
// plus the user preferences persisted between sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_DIR_NAME: &str = "ModpackLauncher";
pub const CONFIG_FILE: &str = "launcher.json";
pub const CONFIG_ENV_VAR: &str = "MODPACK_LAUNCHER_CONFIG";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// Heap sizing constants, in megabytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryPolicy {
    /// Lowest heap ever handed to the game; also the fixed `-Xms`.
    pub floor_mb: u64,
    /// Memory left to the operating system.
    pub reservation_mb: u64,
    /// Upper bound for `-Xmx` regardless of host memory.
    pub ceiling_mb: u64,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            floor_mb: 1024,
            reservation_mb: 2048,
            ceiling_mb: 8192,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkPolicy {
    /// Whole-request bound for small JSON requests (login, remote config).
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Longest wait for the next chunk of an archive download.
    pub stall_timeout_secs: u64,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            stall_timeout_secs: 30,
        }
    }
}

impl NetworkPolicy {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }
}

/// Startup configuration. Constructed once, then passed around as
/// `Arc<LauncherConfig>`; nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Where settings and the config file live.
    pub data_dir: PathBuf,
    /// Root of the installation tree.
    pub game_root: PathBuf,
    /// Bundled artifacts: `java8/` runtime and `authlib/` agent.
    pub resources_dir: PathBuf,
    /// Scratch space for archive downloads, outside the tree.
    pub temp_dir: PathBuf,
    pub remote_config_url: Option<String>,
    /// Base of the server status API; the address is appended as a path.
    pub status_api_url: String,
    pub default_auth_server: String,
    pub memory: MemoryPolicy,
    pub network: NetworkPolicy,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let base = default_base_dir();
        Self {
            game_root: base.join("minecraft_data"),
            resources_dir: base.join("resources"),
            temp_dir: std::env::temp_dir().join(APP_DIR_NAME),
            data_dir: base,
            remote_config_url: None,
            status_api_url: "https://api.mcsrvstat.us/3".into(),
            default_auth_server: "https://littleskin.cn/api/yggdrasil".into(),
            memory: MemoryPolicy::default(),
            network: NetworkPolicy::default(),
        }
    }
}

impl LauncherConfig {
    /// Load from an explicit file, the `MODPACK_LAUNCHER_CONFIG` path, or
    /// `<data_dir>/launcher.json`, in that order. A missing file yields
    /// defaults; an unreadable or invalid one is an error.
    pub fn load(explicit: Option<&Path>) -> LauncherResult<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_ENV_VAR) {
                Some(raw) => PathBuf::from(raw),
                None => default_base_dir().join(CONFIG_FILE),
            },
        };

        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| LauncherError::io(&path, e))?;
            debug!("Loaded launcher config from {:?}", path);
            serde_json::from_str::<LauncherConfig>(&raw)?
        } else {
            debug!("No launcher config at {:?}, using defaults", path);
            LauncherConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LauncherResult<()> {
        let memory = &self.memory;
        if memory.floor_mb == 0 {
            return Err(LauncherError::Config("memory floor must be positive".into()));
        }
        if memory.ceiling_mb < memory.floor_mb {
            return Err(LauncherError::Config(format!(
                "memory ceiling {} MB is below the floor {} MB",
                memory.ceiling_mb, memory.floor_mb
            )));
        }
        let network = &self.network;
        if network.request_timeout_secs == 0
            || network.connect_timeout_secs == 0
            || network.stall_timeout_secs == 0
        {
            return Err(LauncherError::Config("network timeouts must be positive".into()));
        }
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }
}

/// Preferences entered by the user and persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Raw heap override as typed, e.g. `"4096"` or `"4G"`.
    pub memory_max: Option<String>,
    pub java_path: Option<PathBuf>,
    pub auth_server: Option<String>,
    /// Stable per-install token sent with every login.
    pub client_token: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            memory_max: None,
            java_path: None,
            auth_server: None,
            client_token: Uuid::new_v4().simple().to_string(),
        }
    }
}

impl LauncherSettings {
    /// Like `load`, but writes the defaults back when the file was missing
    /// or unreadable so the generated client token survives restarts.
    /// A failed write is logged and the in-memory settings are still used.
    pub fn load_or_init(path: &Path) -> Self {
        if let Some(existing) = Self::read(path) {
            return existing;
        }
        let settings = Self::default();
        match settings.save(path) {
            Ok(()) => debug!("Initialized settings at {:?}", path),
            Err(e) => warn!("Could not persist new settings: {}", e),
        }
        settings
    }

    pub fn load(path: &Path) -> Self {
        Self::read(path).unwrap_or_default()
    }

    fn read(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Corrupt settings at {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| LauncherError::io(path, e))
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
