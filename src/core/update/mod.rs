pub mod events;
pub mod extract;
pub mod orchestrator;
pub mod pipeline;
pub mod sandbox;
pub mod source;

pub use events::{ProgressSink, UpdateEvent, UpdateStatus};
pub use orchestrator::{UpdateMachine, UpdateOrchestrator, UpdateOutcome};
pub use pipeline::{DeleteFailure, UpdateDescriptor, UpdatePipeline, UpdateReport};
pub use source::{ArchiveSource, ArchiveStream, HttpArchiveSource};
