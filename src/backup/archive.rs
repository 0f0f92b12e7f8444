//! Zip archiving of the save-data tree.
//!
//! Archives are written to a `.part` file and renamed into place, so a name
//! ending in `.zip` always denotes a completed archive. Names come from the
//! cycle timestamp; a numeric suffix disambiguates same-second collisions
//! instead of silently overwriting.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::errors::{MbkError, Result};

/// Timestamp-derived archive base name, e.g. `20260830_142500`.
///
/// Second resolution keeps archives lexically ordered by creation time.
#[must_use]
pub fn archive_basename(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y%m%d_%H%M%S").to_string()
}

/// First free `.zip` path in `dir` for `base`, appending `_1`, `_2`, … when
/// the plain name is already taken.
#[must_use]
pub fn unique_archive_path(dir: &Path, base: &str) -> PathBuf {
    let plain = dir.join(format!("{base}.zip"));
    if !plain.exists() {
        return plain;
    }
    for n in 1u32.. {
        let candidate = dir.join(format!("{base}_{n}.zip"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("u32 archive suffixes exhausted");
}

/// Compress the full recursive contents of `source` into `dest_zip`.
///
/// Entry paths are relative to `source`. On any failure the partial file is
/// removed best-effort and `dest_zip` is never created.
pub fn write_archive(source: &Path, dest_zip: &Path) -> Result<()> {
    let part = part_path(dest_zip);
    let outcome = build_zip(source, &part);
    if let Err(err) = outcome {
        let _ = fs::remove_file(&part);
        return Err(err);
    }
    fs::rename(&part, dest_zip).map_err(|source_err| {
        let _ = fs::remove_file(&part);
        MbkError::io(dest_zip, source_err)
    })
}

fn part_path(dest_zip: &Path) -> PathBuf {
    let mut name = dest_zip.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn build_zip(source: &Path, part: &Path) -> Result<()> {
    let file = File::create(part).map_err(|err| MbkError::io(part, err))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| source.to_path_buf(), Path::to_path_buf);
            match err.into_io_error() {
                Some(io_err) => MbkError::Io {
                    path,
                    source: io_err,
                },
                None => MbkError::Archive {
                    path,
                    details: "walk entry unavailable".to_string(),
                },
            }
        })?;

        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| MbkError::Archive {
                path: entry.path().to_path_buf(),
                details: err.to_string(),
            })?;
        if rel.as_os_str().is_empty() {
            continue; // the source root itself
        }
        let name = zip_entry_name(rel);

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|err| zip_err(entry.path(), &err))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name, options)
                .map_err(|err| zip_err(entry.path(), &err))?;
            let mut input =
                File::open(entry.path()).map_err(|err| MbkError::io(entry.path(), err))?;
            io::copy(&mut input, &mut writer).map_err(|err| MbkError::io(entry.path(), err))?;
        }
        // Symlinks and other special files are skipped; the save data is plain
        // files and folders.
    }

    writer
        .finish()
        .map_err(|err| zip_err(part, &err))?
        .sync_all()
        .map_err(|err| MbkError::io(part, err))?;
    Ok(())
}

fn zip_entry_name(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

fn zip_err(path: &Path, err: &zip::result::ZipError) -> MbkError {
    MbkError::Archive {
        path: path.to_path_buf(),
        details: err.to_string(),
    }
}
