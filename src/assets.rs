//! Copies the project's static assets into the output directory unchanged.

use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively copies everything under `src` into `dst`, creating `dst` and
/// any intermediate directories. A missing `src` copies nothing. Returns the
/// number of files copied.
pub fn copy_assets(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        tracing::debug!(path = %src.display(), "no assets directory; skipping");
        return Ok(0);
    }

    let mut copied = 0;
    for result in WalkDir::new(src).min_depth(1) {
        let entry = result?;
        // strip_prefix can't fail; every entry is under `src`
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|err| Error::Copy {
                path: target.clone(),
                err,
            })?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|err| Error::Copy {
                    path: parent.to_owned(),
                    err,
                })?;
            }
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                path: entry.path().to_owned(),
                err,
            })?;
            copied += 1;
        }
    }
    tracing::info!(files = copied, "copied assets");
    Ok(copied)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem copying assets.
#[derive(Debug)]
pub enum Error {
    /// Returned when walking the assets directory fails.
    WalkDir(walkdir::Error),

    /// Returned when a file or directory can't be copied or created.
    Copy { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Copy { path, err } => {
                write!(f, "Copying asset '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Copy { err, .. } => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
