//! Compressed snapshots of the project tree taken before a version change.

use crate::error::{Result, WardenError};
use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Timestamp layout used in backup file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name of a backup: `backup_<version>_<YYYYMMDD_HHMMSS>.tar.gz`
pub fn backup_file_name(version: &str, at: &DateTime<Local>) -> String {
    format!("backup_{}_{}.tar.gz", version, at.format(TIMESTAMP_FORMAT))
}

/// Write a gzip-compressed tarball of `source` into `backup_dir`
///
/// Entries whose file name is listed in `excludes` are skipped at any depth,
/// as is `backup_dir` itself. Symlinks are stored as links. A partially
/// written archive is removed when any entry fails.
pub fn create_backup(
    source: &Path,
    backup_dir: &Path,
    excludes: &[String],
    version: &str,
) -> Result<PathBuf> {
    if !source.is_dir() {
        return Err(WardenError::BackupError(format!(
            "Source directory does not exist: {}",
            source.display()
        )));
    }

    std::fs::create_dir_all(backup_dir).map_err(|e| {
        WardenError::BackupError(format!(
            "Failed to create backup directory {}: {}",
            backup_dir.display(),
            e
        ))
    })?;

    let archive_path = backup_dir.join(backup_file_name(version, &Local::now()));
    let skip_dir = backup_dir.canonicalize().ok();

    match write_archive(source, &archive_path, excludes, skip_dir.as_deref()) {
        Ok(()) => Ok(archive_path),
        Err(e) => {
            let _ = std::fs::remove_file(&archive_path);
            Err(e)
        }
    }
}

fn write_archive(
    source: &Path,
    archive_path: &Path,
    excludes: &[String],
    skip_dir: Option<&Path>,
) -> Result<()> {
    let file = File::create(archive_path).map_err(|e| {
        WardenError::BackupError(format!("Failed to create {}: {}", archive_path.display(), e))
    })?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    append_dir(&mut builder, source, Path::new(""), excludes, skip_dir, archive_path)?;

    let encoder = builder
        .into_inner()
        .map_err(|e| WardenError::BackupError(format!("Failed to finish archive: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| WardenError::BackupError(format!("Failed to compress archive: {}", e)))?;

    Ok(())
}

fn append_dir<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    dir: &Path,
    relative: &Path,
    excludes: &[String],
    skip_dir: Option<&Path>,
    archive_path: &Path,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        WardenError::BackupError(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| WardenError::BackupError(format!("Failed to read entry: {}", e)))?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        let Some(name) = path.file_name() else {
            continue;
        };
        if excludes.iter().any(|ex| name == ex.as_str()) || path == archive_path {
            continue;
        }
        if skip_dir.is_some() && path.canonicalize().ok().as_deref() == skip_dir {
            continue;
        }

        let entry_name = relative.join(name);
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| {
            WardenError::BackupError(format!("Failed to stat {}: {}", path.display(), e))
        })?;

        if metadata.is_dir() {
            builder
                .append_dir(&entry_name, &path)
                .map_err(|e| archive_error(&path, e))?;
            append_dir(builder, &path, &entry_name, excludes, skip_dir, archive_path)?;
        } else {
            builder
                .append_path_with_name(&path, &entry_name)
                .map_err(|e| archive_error(&path, e))?;
        }
    }

    Ok(())
}

fn archive_error(path: &Path, e: std::io::Error) -> WardenError {
    WardenError::BackupError(format!("Failed to archive {}: {}", path.display(), e))
}
