// ─── Modpack Launcher Core ───
// Provisioning, update and launch-configuration engine for a modpack
// client installation.
//
// Architecture:
//   core/
//     config/       — Startup config + persisted user settings
//     installation/ — Installation tree, version marker, version resolver
//     update/       — Archive download, clean, extract, commit + state machine
//     memory/       — Heap sizing from host memory
//     auth/         — Yggdrasil login + offline profiles
//     java/         — Bundled runtime and authlib agent locations
//     launch/       — Launch descriptor, configurator, executor seam
//     remote/       — Remote announcement/modpack document
//     state/        — Facade wiring everything for a host UI

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod installation;
pub mod java;
pub mod launch;
pub mod memory;
pub mod remote;
pub mod state;
pub mod update;
