//! Loading a program's source text from `-f FILE` or `-e EXPR`.

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum LoadError {
    Io { path: std::path::PathBuf, source: std::io::Error },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
        }
    }
}

/// `clap`'s `ArgGroup` guarantees exactly one of `file`/`expr` is set, so
/// this never has to guess which source the caller meant.
pub fn load(file: Option<&Path>, expr: Option<&str>) -> Result<String, LoadError> {
    if let Some(path) = file {
        std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    } else {
        Ok(expr.unwrap_or_default().to_string())
    }
}
