//! Backup Coordination
//!
//! Snapshot-before-mutate protection for table files. A snapshot is taken
//! before any merge touches the file and discarded only after the full
//! merge, validation, write, and metadata-update sequence succeeds; any
//! failure in between restores the snapshot over whatever the failed
//! operation left behind.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::BACKUP_TIMESTAMP_FORMAT;
use crate::error::{Error, Result};

pub struct BackupCoordinator;

impl BackupCoordinator {
    /// Copy `path` to a timestamped sibling, returning the backup path.
    ///
    /// Returns `Ok(None)` when there is nothing to protect.
    pub fn snapshot(path: &Path) -> Result<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("Invalid file name: {}", path.display())))?;

        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_path = path.with_file_name(format!("{}_backup_{}.csv", stem, timestamp));

        fs::copy(path, &backup_path).map_err(|e| {
            Error::Io(format!(
                "Failed to back up {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(backup = %backup_path.display(), "Created backup");
        Ok(Some(backup_path))
    }

    /// Move the backup back over the original path.
    ///
    /// Must succeed even when the original was partially written or
    /// corrupted by the failed operation, so this is an overwrite, never a
    /// merge. Returns whether the restore happened.
    pub fn restore(path: &Path, backup_path: &Path) -> bool {
        if !backup_path.exists() {
            error!(backup = %backup_path.display(), "Backup file missing, cannot restore");
            return false;
        }

        // rename is atomic on the same filesystem; fall back to copy+remove
        // if the rename is refused.
        let moved = match fs::rename(backup_path, path) {
            Ok(()) => true,
            Err(_) => fs::copy(backup_path, path)
                .and_then(|_| fs::remove_file(backup_path))
                .is_ok(),
        };

        if moved {
            info!(path = %path.display(), "Restored table from backup");
        } else {
            error!(
                path = %path.display(),
                backup = %backup_path.display(),
                "Restore from backup failed"
            );
        }
        moved
    }

    /// Delete a no-longer-needed backup after a fully successful update
    pub fn discard(backup_path: &Path) {
        if !backup_path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(backup_path) {
            warn!(backup = %backup_path.display(), error = %e, "Failed to remove backup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_of_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result = BackupCoordinator::snapshot(&dir.path().join("absent.csv")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_snapshot_copies_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("101W09.csv");
        fs::write(&path, "stck_bsop_date,close\n20240101,100\n").unwrap();

        let backup = BackupCoordinator::snapshot(&path).unwrap().unwrap();
        assert!(backup.exists());
        assert!(backup
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("101W09_backup_"));
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&path).unwrap());
    }

    #[test]
    fn test_restore_overwrites_partial_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let original = "stck_bsop_date,close\n20240101,100\n";
        fs::write(&path, original).unwrap();

        let backup = BackupCoordinator::snapshot(&path).unwrap().unwrap();

        // Simulate a partially-written, corrupted table left by a failed merge
        fs::write(&path, "stck_bsop_date,clo").unwrap();

        assert!(BackupCoordinator::restore(&path, &backup));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(!backup.exists());
    }

    #[test]
    fn test_restore_without_backup_reports_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        assert!(!BackupCoordinator::restore(&path, &dir.path().join("no_backup.csv")));
    }

    #[test]
    fn test_discard_removes_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let backup = BackupCoordinator::snapshot(&path).unwrap().unwrap();
        BackupCoordinator::discard(&backup);
        assert!(!backup.exists());

        // Discarding twice is a no-op
        BackupCoordinator::discard(&backup);
    }
}
