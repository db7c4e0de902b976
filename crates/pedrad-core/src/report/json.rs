use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn timestamped_path(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, Utc::now().format("%Y%m%d_%H%M%S"), ext))
}

pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
