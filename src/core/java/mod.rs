pub mod paths;

pub use paths::{authlib_agent_argument, authlib_injector_path, bundled_java_path};
