//! Loading program text from disk or the command line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

/// Failure to produce program text for one source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Read { path, .. } => path,
        }
    }
}

/// Program text together with a name used when reporting errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: Vec<u8>,
}

impl Source {
    /// Wrap code given directly (e.g. with `--eval`).
    pub fn inline(name: impl Into<String>, text: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Read the raw bytes of the file at `path`.
///
/// No UTF-8 validation happens here; bytes outside the instruction set are
/// comments to the engine.
pub fn load_source(path: impl AsRef<Path>) -> Result<Source, LoadError> {
    let path = path.as_ref();
    let text = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded {} bytes from {}", text.len(), path.display());

    Ok(Source {
        name: path.display().to_string(),
        text,
    })
}
