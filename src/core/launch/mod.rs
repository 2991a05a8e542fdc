pub mod configure;
pub mod descriptor;
pub mod executor;

pub use configure::{LaunchConfigurator, LaunchPlan, LaunchRequest, LaunchWarning};
pub use descriptor::{ConnectTarget, LaunchDescriptor};
pub use executor::{LaunchEvent, LaunchExecutor};
