//! Whole-document JSON persistence shared by the rule and journal stores.
//!
//! Documents are always read in full and written in full. Writes go to a
//! sibling temporary file that is renamed over the target, so readers see
//! either the old or the new document, never a partial one.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Read a JSON document, creating it with `default` first if it does not exist.
///
/// A document that exists but does not parse is reported and replaced by
/// `default` in memory only; the file on disk is left for inspection.
pub async fn read_or_init<T>(path: &Path, default: T) -> Result<T, StoreError>
where
    T: Serialize + DeserializeOwned,
{
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Creating {} with an empty document", path.display());
            write_json_atomic(path, &default).await?;
            return Ok(default);
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to parse document, falling back to empty default"
            );
            Ok(default)
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json).await
}

pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let result = write_and_sync(&temp_path, contents).await;
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

async fn write_and_sync(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

/// Unique per write so concurrent writers never share a temp file.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}
