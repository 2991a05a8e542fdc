pub mod core;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::state::AppState;
use crate::core::update::{UpdateEvent, UpdateOutcome};

pub use crate::core::error::LauncherError;

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,modpack_launcher_lib=debug")),
        )
        .try_init();
}

/// Headless run: load config, sync the modpack against the remote
/// document when one is configured, and report the installed version.
pub async fn run(config_path: Option<&Path>) -> LauncherResult<()> {
    init_tracing();
    tracing::info!("Modpack launcher starting...");

    let config = Arc::new(LauncherConfig::load(config_path)?);
    let state = AppState::new(config)?;

    if let Some(remote) = state.fetch_remote_config().await? {
        if let Some(news) = &remote.news {
            println!("== {} ==", news.title);
            for item in &news.items {
                println!("  - {}", item.text());
            }
        }

        match state.server_status(&remote).await {
            Ok(Some(status)) => println!("Server: {status}"),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Server status unavailable: {}", e);
                println!("Server: offline");
            }
        }

        if let Some(descriptor) = remote.modpack_update() {
            let (tx, mut rx) = mpsc::unbounded_channel::<UpdateEvent>();
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        UpdateEvent::Phase { status, percent } => {
                            println!("[{status}] {percent:.0}%")
                        }
                        UpdateEvent::Percent { percent } => println!("  {percent:.0}%"),
                        UpdateEvent::Line { message } => println!("  {message}"),
                    }
                }
            });

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let outcome = state.sync_modpack(&descriptor, &tx, &cancel).await;
            drop(tx);
            let _ = printer.await;

            match outcome? {
                UpdateOutcome::UpToDate { version } => println!("Modpack up to date ({version})"),
                UpdateOutcome::Updated(report) => {
                    println!("Modpack updated to {}", report.version);
                    for failure in &report.failed_deletions {
                        println!("  could not delete {}: {}", failure.path.display(), failure.reason);
                    }
                }
            }
        }

        if let Some(target) = remote.autoconnect_target() {
            println!("Autoconnect: {target}");
        }
    }

    match state.local_version().await {
        Some(version) => println!("Installed modpack version: {version}"),
        None => println!("No modpack installed yet at {}", state.tree.root().display()),
    }
    Ok(())
}
