use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    if let Err(err) = modpack_launcher_lib::run(config_path.as_deref()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
