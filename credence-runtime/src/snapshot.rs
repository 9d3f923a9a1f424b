//! Ledger persistence
//!
//! The registry is stored as a flat JSON object mapping canonical domain to
//! its record.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use credence_core::{DomainRecord, DomainRegistry};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a snapshot. A missing file is an empty ledger.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<BTreeMap<String, DomainRecord>, SnapshotError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No snapshot at {}, starting empty", path.display());
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&contents)?)
}

/// Write the registry to `path`, creating parent directories as needed
pub fn save_snapshot(registry: &DomainRegistry, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let snapshot = registry.snapshot();
    fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    info!("Saved {} domain records to {}", snapshot.len(), path.display());
    Ok(())
}

/// Restore a snapshot into the registry, if one exists
pub fn restore_snapshot(registry: &DomainRegistry, path: impl AsRef<Path>) -> Result<usize, SnapshotError> {
    let records = load_snapshot(path)?;
    let count = records.len();
    registry.restore(records);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_core::Membership;

    #[test]
    fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = load_snapshot(dir.path().join("ledger.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let registry = DomainRegistry::with_curated_seeds();
        for _ in 0..3 {
            registry.report("coindesk.com", false);
        }
        save_snapshot(&registry, &path).unwrap();

        let restored = DomainRegistry::new();
        let count = restore_snapshot(&restored, &path).unwrap();
        assert_eq!(count, registry.len());
        assert_eq!(restored.membership("coindesk.com"), Membership::RedFlagged);
        assert_eq!(restored.record("coindesk.com"), registry.record("coindesk.com"));
    }

    #[test]
    fn test_flat_map_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let registry = DomainRegistry::new();
        registry.report("https://www.example.com/a", true);
        save_snapshot(&registry, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["example.com"]["membership"], "neutral");
        assert_eq!(json["example.com"]["accuracy"]["correct"], 1);
    }

    #[test]
    fn test_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Json(_))));
    }
}
