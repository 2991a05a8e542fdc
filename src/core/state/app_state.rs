use std::sync::Arc;

use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::auth::{AuthenticationResult, YggdrasilClient};
use crate::core::config::{LauncherConfig, LauncherSettings};
use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::installation::InstallationTree;
use crate::core::launch::{
    LaunchConfigurator, LaunchEvent, LaunchExecutor, LaunchPlan, LaunchRequest, LaunchWarning,
};
use crate::core::remote::{RemoteLauncherConfig, ServerStatus};
use crate::core::update::{
    ArchiveSource, HttpArchiveSource, ProgressSink, UpdateDescriptor, UpdateOrchestrator,
    UpdateOutcome, UpdatePipeline,
};

/// Everything a host UI needs, wired from one immutable config.
///
/// Updates and launches against the tree are serialized through one lock,
/// so a UI that fires both at once waits instead of corrupting the tree.
pub struct AppState {
    pub config: Arc<LauncherConfig>,
    pub tree: InstallationTree,
    pub http_client: Client,
    pub settings: LauncherSettings,
    orchestrator: UpdateOrchestrator,
    tree_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: Arc<LauncherConfig>) -> LauncherResult<Self> {
        let http_client = build_http_client(&config.network)?;
        let source = Arc::new(HttpArchiveSource::new(http_client.clone()));
        Self::with_source(config, http_client, source)
    }

    /// Same as `new` with a custom archive transport.
    pub fn with_source(
        config: Arc<LauncherConfig>,
        http_client: Client,
        source: Arc<dyn ArchiveSource>,
    ) -> LauncherResult<Self> {
        config.validate()?;

        let tree = InstallationTree::new(&config.game_root);
        let settings = LauncherSettings::load_or_init(&config.settings_path());
        let pipeline = UpdatePipeline::new(
            source,
            config.temp_dir.clone(),
            config.network.stall_timeout(),
        );

        Ok(Self {
            config,
            tree,
            http_client,
            settings,
            orchestrator: UpdateOrchestrator::new(pipeline),
            tree_lock: Mutex::new(()),
        })
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        self.settings.save(&self.config.settings_path())
    }

    /// Auth server chosen by the user, else the configured default.
    pub fn auth_server(&self) -> &str {
        self.settings
            .auth_server
            .as_deref()
            .filter(|server| !server.trim().is_empty())
            .unwrap_or(self.config.default_auth_server.as_str())
    }

    pub async fn login(&self, username: &str, password: &str) -> LauncherResult<AuthenticationResult> {
        let client = YggdrasilClient::new(
            self.http_client.clone(),
            self.config.network.request_timeout(),
        );
        client
            .authenticate(self.auth_server(), username, password, &self.settings.client_token)
            .await
    }

    /// `None` when no remote config URL is configured.
    pub async fn fetch_remote_config(&self) -> LauncherResult<Option<RemoteLauncherConfig>> {
        let Some(url) = self.config.remote_config_url.as_deref() else {
            return Ok(None);
        };
        RemoteLauncherConfig::fetch(&self.http_client, url, self.config.network.request_timeout())
            .await
            .map(Some)
    }

    /// Status of the server the remote document points at; `None` when it
    /// names no address. A dead status API surfaces as a download error.
    pub async fn server_status(
        &self,
        remote: &RemoteLauncherConfig,
    ) -> LauncherResult<Option<ServerStatus>> {
        let Some(address) = remote.status_address() else {
            return Ok(None);
        };
        ServerStatus::fetch(
            &self.http_client,
            &self.config.status_api_url,
            address,
            self.config.network.request_timeout(),
        )
        .await
        .map(Some)
    }

    pub async fn local_version(&self) -> Option<String> {
        self.tree.local_version().await
    }

    /// Bring the tree to `descriptor.version`, or do nothing if it is
    /// already there.
    pub async fn sync_modpack(
        &self,
        descriptor: &UpdateDescriptor,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> LauncherResult<UpdateOutcome> {
        let _guard = self.tree_lock.lock().await;
        self.orchestrator
            .run(&self.tree, descriptor, sink, cancel)
            .await
    }

    /// Launch request pre-filled from the saved preferences.
    pub fn launch_request(
        &self,
        authorization: AuthenticationResult,
        connect_target: Option<String>,
    ) -> LaunchRequest {
        LaunchRequest {
            version_override: None,
            memory_override: self.settings.memory_max.clone(),
            java_path_override: self.settings.java_path.clone(),
            authorization,
            auth_server: self.auth_server().to_string(),
            connect_target,
        }
    }

    pub async fn prepare_launch(&self, request: LaunchRequest) -> LauncherResult<LaunchPlan> {
        LaunchConfigurator::new(&self.config)
            .configure(&self.tree, request)
            .await
    }

    /// Configure and hand off to `executor`. Returns the non-fatal
    /// warnings so the UI can show them next to the running game.
    pub async fn launch(
        &self,
        executor: &dyn LaunchExecutor,
        request: LaunchRequest,
        events: UnboundedSender<LaunchEvent>,
    ) -> LauncherResult<Vec<LaunchWarning>> {
        let _guard = self.tree_lock.lock().await;
        let plan = self.prepare_launch(request).await?;
        for warning in &plan.warnings {
            warn!("{}", warning);
        }

        info!(
            "Handing off {} to the launch executor",
            plan.descriptor.version
        );
        executor.launch(plan.descriptor, events).await?;
        Ok(plan.warnings)
    }
}
