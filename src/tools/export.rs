//! Export Module
//!
//! Writes a complete dataset to disk as pretty-printed JSON, confined to a
//! single export directory.

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{Result, ToolError};
use crate::pagination::{heavy_rule, Dataset};

/// Directory exports land in when none is configured
pub const DEFAULT_EXPORT_DIR: &str = "./exports";

/// Writes `dataset` to `requested` under `export_dir` and returns the
/// confirmation text.
///
/// `requested` must be a relative path that stays inside `export_dir`:
/// absolute paths and `..` components are rejected with
/// [`ToolError::InvalidArgument`]. Tables are written as an array of
/// records, key-value data as a single object. Missing parent directories
/// are created.
pub async fn export_json(
    dataset: &Dataset,
    export_dir: impl AsRef<Path>,
    requested: impl AsRef<Path>,
) -> Result<String> {
    let path = resolve(export_dir.as_ref(), requested.as_ref())?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_string_pretty(&dataset.to_json())?;
    tokio::fs::write(&path, body).await?;
    let size = tokio::fs::metadata(&path).await?.len();

    let items = match dataset {
        Dataset::Table(table) => table.len(),
        Dataset::KeyValue(_) => 1,
    };
    info!(path = %path.display(), size, items, "exported dataset");

    Ok(confirmation(&path, size, items))
}

fn resolve(export_dir: &Path, requested: &Path) -> Result<PathBuf> {
    let rejected = |reason: &str| {
        ToolError::InvalidArgument(format!("export_path '{}' {}", requested.display(), reason))
    };

    let mut relative = PathBuf::new();
    for component in requested.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(rejected("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(rejected("must be relative to the export directory"))
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(rejected("must name a file"));
    }

    let root = if export_dir.is_absolute() {
        export_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(export_dir)
    };
    Ok(root.join(relative))
}

fn confirmation(path: &Path, size: u64, items: usize) -> String {
    let heavy = heavy_rule();
    [
        heavy.clone(),
        "✅ DATA EXPORTED SUCCESSFULLY".to_string(),
        heavy.clone(),
        String::new(),
        format!("📁 File: {}", path.display()),
        format!("📊 Size: {:.2} KB", size as f64 / 1024.0),
        format!("📝 Items: {}", items),
        String::new(),
        "The complete dataset has been saved to the specified file.".to_string(),
        heavy,
    ]
    .join("\n")
}
