use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use harvest_logging::harvest_warn;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::timestamped_fallback;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not write {target:?} ({primary}) nor fallback {fallback:?} ({secondary})")]
    FallbackFailed {
        target: PathBuf,
        primary: Box<PersistError>,
        fallback: PathBuf,
        secondary: Box<PersistError>,
    },
}

/// Where a file ended up after [`write_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// The requested path, when the file had to be written elsewhere.
    pub substituted_for: Option<PathBuf>,
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write `content` to `target` by writing a sibling temp file then renaming.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<(), PersistError> {
    let dir = parent_dir(target);
    ensure_output_dir(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    // A busy or non-file target fails here, before anything is replaced.
    if target.exists() {
        fs::remove_file(target)?;
    }
    tmp.persist(target).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Write `content` to `target`; if that fails, write it to a
/// timestamp-suffixed sibling and report the substitution.
pub fn write_with_fallback(target: &Path, content: &[u8]) -> Result<WriteOutcome, PersistError> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    write_with_fallback_stamped(target, content, &stamp)
}

pub(crate) fn write_with_fallback_stamped(
    target: &Path,
    content: &[u8],
    stamp: &str,
) -> Result<WriteOutcome, PersistError> {
    let primary = match write_atomic(target, content) {
        Ok(()) => {
            return Ok(WriteOutcome {
                path: target.to_path_buf(),
                substituted_for: None,
            })
        }
        Err(err) => err,
    };

    let fallback = timestamped_fallback(target, stamp);
    harvest_warn!(
        "cannot write {:?} ({}); writing {:?} instead",
        target,
        primary,
        fallback
    );
    match write_atomic(&fallback, content) {
        Ok(()) => Ok(WriteOutcome {
            path: fallback,
            substituted_for: Some(target.to_path_buf()),
        }),
        Err(secondary) => Err(PersistError::FallbackFailed {
            target: target.to_path_buf(),
            primary: Box::new(primary),
            fallback,
            secondary: Box::new(secondary),
        }),
    }
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
