use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable naming the data directory explicitly.
pub const DATA_DIR_ENV_VAR: &str = "DUSTBOWL_DATA_DIR";

/// Cached path to the directory containing the engine's runtime data files.
static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(detect_data_root);

/// Construct a data path relative to the resolved data root.
pub fn data_path(relative: impl AsRef<Path>) -> PathBuf {
    DATA_ROOT.join(relative)
}

/// Resolve the most likely location of the runtime data directory.
///
/// `DUSTBOWL_DATA_DIR` wins when set; otherwise the workspace and flattened layouts are
/// tried relative to the working directory and the executable.
fn detect_data_root() -> PathBuf {
    let mut candidates = Vec::new();
    if let Some(dir) = env::var_os(DATA_DIR_ENV_VAR) {
        candidates.push(PathBuf::from(dir));
    }

    // Common layouts: workspace root and flattened `data/`.
    candidates.push(PathBuf::from("dustbowl_engine/data"));
    candidates.push(PathBuf::from("data"));

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("dustbowl_engine/data"));
        candidates.push(dir.join("data"));

        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("dustbowl_engine/data"));
            candidates.push(parent.join("data"));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("dustbowl_engine/data"))
}
