//! Atomic file writes
//!
//! State documents are always rewritten in full. To avoid leaving a truncated
//! document behind when the process dies mid-write, content is written to a
//! sibling `<name>.tmp` file first and then renamed over the target. A rename
//! within one directory replaces the target in a single step on all supported
//! platforms.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Path of the temporary sibling used while writing `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write `contents` to `target` via temp file + rename (blocking)
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path_for(target);
    std::fs::write(&tmp, contents)?;

    if let Err(e) = std::fs::rename(&tmp, target) {
        // Best-effort cleanup so a stale temp file does not linger
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically (async)
pub async fn write_json_atomic<T: Serialize>(target: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_path_for(target);
    tokio::fs::write(&tmp, &json).await?;

    if let Err(e) = tokio::fs::rename(&tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::Io(e));
    }

    tracing::debug!(path = %target.display(), bytes = json.len(), "Wrote state document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_for_appends_suffix() {
        let tmp = temp_path_for(Path::new("/state/learning_data.json"));
        assert_eq!(tmp, PathBuf::from("/state/learning_data.json.tmp"));
    }

    #[test]
    fn test_write_atomic_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("doc.json");
        std::fs::write(&target, b"old").unwrap();

        write_atomic(&target, b"new").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_write_atomic_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested/deeper/doc.json");

        write_atomic(&target, b"{}").unwrap();

        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_write_json_atomic_round_trips() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("prefs.json");
        let value = serde_json::json!({ "naming.style": { "strength": 0.8 } });

        write_json_atomic(&target, &value).await.unwrap();

        let loaded: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&target).unwrap()).unwrap();
        assert_eq!(loaded, value);
        assert!(!temp_path_for(&target).exists());
    }
}
