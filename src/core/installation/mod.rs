pub mod model;
pub mod resolver;

pub use model::{InstallationTree, VersionMarker, MARKER_FILE};
pub use resolver::{resolve_version, select_version};
