use std::path::{Path, PathBuf};

/// Java runtime shipped next to the launcher: `<resources>/java8/bin/java`.
pub fn bundled_java_path(resources_dir: &Path) -> PathBuf {
    let binary = if cfg!(target_os = "windows") {
        "java.exe"
    } else {
        "java"
    };
    resources_dir.join("java8").join("bin").join(binary)
}

/// authlib-injector agent that redirects the game's session checks.
pub fn authlib_injector_path(resources_dir: &Path) -> PathBuf {
    resources_dir.join("authlib").join("authlib-injector.jar")
}

/// The `-javaagent` argument pointing the agent at `auth_server`.
pub fn authlib_agent_argument(agent: &Path, auth_server: &str) -> String {
    format!("-javaagent:{}={}", agent.display(), auth_server)
}
