use crate::error::Result;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Copy the data file into a `backups/` directory next to it, stamped with
/// the current time, then prune the oldest copies beyond `retention`.
///
/// Returns the backup path, or `None` when there is no data file yet.
pub(crate) fn backup_data_file(path: &Path, retention: usize) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent.join("backups");
    std::fs::create_dir_all(&backup_dir)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("xlsx");
    // The stamp has one-second resolution; a sequence suffix keeps rapid
    // successive saves from overwriting each other's backup.
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut backup_path = backup_dir.join(format!("{stem}_{stamp}.{ext}"));
    let mut seq = 1;
    while backup_path.exists() {
        backup_path = backup_dir.join(format!("{stem}_{stamp}_{seq}.{ext}"));
        seq += 1;
    }

    std::fs::copy(path, &backup_path)?;
    prune_backups(&backup_dir, stem, retention)?;

    Ok(Some(backup_path))
}

/// Delete the oldest backups of `stem` until at most `retention` remain.
/// The timestamp suffix sorts lexicographically in age order.
fn prune_backups(backup_dir: &Path, stem: &str, retention: usize) -> Result<()> {
    let prefix = format!("{stem}_");
    let mut names: Vec<String> = std::fs::read_dir(backup_dir)?
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix))
        .collect();
    names.sort();

    while names.len() > retention {
        let oldest = names.remove(0);
        tracing::debug!("pruning backup {oldest}");
        std::fs::remove_file(backup_dir.join(oldest))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_no_file_no_backup() {
        let dir = tempdir().unwrap();
        let result = backup_data_file(&dir.path().join("missing.xlsx"), 10).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_backup_copies_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.xlsx");
        std::fs::write(&path, b"workbook bytes").unwrap();

        let backup = backup_data_file(&path, 10).unwrap().unwrap();
        assert!(backup.exists());
        assert_eq!(std::fs::read(&backup).unwrap(), b"workbook bytes");
        assert!(backup.parent().unwrap().ends_with("backups"));
    }

    #[test]
    fn test_rapid_backups_get_distinct_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.xlsx");

        // Two saves inside the same second must not share a backup file.
        std::fs::write(&path, b"v1").unwrap();
        let first = backup_data_file(&path, 10).unwrap().unwrap();
        std::fs::write(&path, b"v2").unwrap();
        let second = backup_data_file(&path, 10).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"v1");
        assert_eq!(std::fs::read(&second).unwrap(), b"v2");
    }

    #[test]
    fn test_retention_prunes_oldest() {
        let dir = tempdir().unwrap();
        let backup_dir = dir.path().join("backups");
        std::fs::create_dir_all(&backup_dir).unwrap();

        // Seed stale backups with sortable stamps.
        for stamp in ["20200101_000000", "20200102_000000", "20200103_000000"] {
            std::fs::write(backup_dir.join(format!("catalog_{stamp}.xlsx")), b"old").unwrap();
        }

        let path = dir.path().join("catalog.xlsx");
        std::fs::write(&path, b"current").unwrap();
        backup_data_file(&path, 2).unwrap();

        let mut remaining: Vec<String> = std::fs::read_dir(&backup_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        remaining.sort();

        assert_eq!(remaining.len(), 2);
        // The two oldest seeds are gone.
        assert!(!remaining.contains(&"catalog_20200101_000000.xlsx".to_string()));
        assert!(!remaining.contains(&"catalog_20200102_000000.xlsx".to_string()));
    }
}
