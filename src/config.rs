use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BUNDLED_DIR: &str = "pandoc_bin";

/// Settings shared by every tool call, fixed at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub pandoc: PathBuf,
    pub user_filter_dir: PathBuf,
}

impl Config {
    pub fn resolve(pandoc: Option<PathBuf>, user_filter_dir: Option<PathBuf>) -> Self {
        let pandoc = pandoc.unwrap_or_else(discover_pandoc);
        let user_filter_dir = user_filter_dir.unwrap_or_else(default_user_filter_dir);
        info!(
            pandoc = %pandoc.display(),
            user_filter_dir = %user_filter_dir.display(),
            "converter configured"
        );
        Self {
            pandoc,
            user_filter_dir,
        }
    }
}

/// `~/.pandoc/filters`, the converter's own per-user filter location.
pub fn default_user_filter_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pandoc")
        .join("filters")
}

fn pandoc_file_name() -> &'static str {
    if cfg!(windows) { "pandoc.exe" } else { "pandoc" }
}

fn discover_pandoc() -> PathBuf {
    let bundled = Path::new(BUNDLED_DIR).join(pandoc_file_name());
    if bundled.is_file() {
        return std::path::absolute(&bundled).unwrap_or(bundled);
    }
    match which::which("pandoc") {
        Ok(path) => path,
        Err(err) => {
            warn!(
                error = %err,
                "pandoc not found on PATH; conversions will fail until it is installed"
            );
            PathBuf::from(pandoc_file_name())
        }
    }
}
