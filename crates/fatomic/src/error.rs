use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The step of a write session an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Stage,
    Seed,
    Read,
    Write,
    Commit,
    Config,
}

#[derive(Error, Debug)]
pub enum FatomicError {
    #[error("invalid mode: '{0}'")]
    InvalidMode(String),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("invalid target path: {0}")]
    InvalidTarget(PathBuf),

    #[error("failed to create staging file for {path}: {source}")]
    Stage { path: PathBuf, source: io::Error },

    #[error("failed to seed staging file from {path}: {source}")]
    Seed { path: PathBuf, source: io::Error },

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write staging file for {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to replace {path}: {source}")]
    Commit { path: PathBuf, source: io::Error },

    #[error("Config error: {0}")]
    Config(String),
}

impl FatomicError {
    pub fn phase(&self) -> Phase {
        match self {
            FatomicError::InvalidMode(_)
            | FatomicError::InvalidChunkSize
            | FatomicError::InvalidTarget(_) => Phase::Request,
            FatomicError::Stage { .. } => Phase::Stage,
            FatomicError::Seed { .. } => Phase::Seed,
            FatomicError::Read { .. } => Phase::Read,
            FatomicError::Write { .. } => Phase::Write,
            FatomicError::Commit { .. } => Phase::Commit,
            FatomicError::Config(_) => Phase::Config,
        }
    }

    /// The underlying I/O error, if this failure came from the filesystem.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            FatomicError::Stage { source, .. }
            | FatomicError::Seed { source, .. }
            | FatomicError::Read { source, .. }
            | FatomicError::Write { source, .. }
            | FatomicError::Commit { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<confique::Error> for FatomicError {
    fn from(err: confique::Error) -> Self {
        FatomicError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FatomicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_mapping() {
        let err = FatomicError::InvalidMode("r+".to_string());
        assert_eq!(err.phase(), Phase::Request);
        assert!(err.io_error().is_none());

        let err = FatomicError::Commit {
            path: PathBuf::from("a.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.phase(), Phase::Commit);
        assert_eq!(
            err.io_error().map(|e| e.kind()),
            Some(io::ErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn test_display_names_the_path() {
        let err = FatomicError::Seed {
            path: PathBuf::from("notes.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("notes.txt"));
        assert!(err.to_string().starts_with("failed to seed"));
    }
}
