//! Error types for volume IO operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable error classes for load and export operations.
///
/// Every [`VoxelIoError`] maps to exactly one kind, so callers can branch on
/// error class (e.g. "try the next registered loader") without inspecting
/// message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File could not be opened.
    FileOpen,
    /// File could not be read.
    FileRead,
    /// File could not be written.
    FileWrite,
    /// Stream ended before a required terminator or payload was found.
    DataTruncated,
    /// Malformed or unsupported header field/value.
    Parse,
    /// Invalid argument passed by the caller.
    InvalidArgument,
    /// No decoder claims this file.
    UnsupportedFormat,
}

/// Main error type for volume decode/encode operations
#[derive(Error, Debug)]
pub enum VoxelIoError {
    #[error("cannot open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {reason}", path.display())]
    FileRead { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", path.display())]
    FileWrite { path: PathBuf, reason: String },

    #[error("truncated data in {}: {reason}", path.display())]
    DataTruncated { path: PathBuf, reason: String },

    #[error("parse error in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl VoxelIoError {
    /// The stable class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoxelIoError::FileOpen { .. } => ErrorKind::FileOpen,
            VoxelIoError::FileRead { .. } => ErrorKind::FileRead,
            VoxelIoError::FileWrite { .. } => ErrorKind::FileWrite,
            VoxelIoError::DataTruncated { .. } => ErrorKind::DataTruncated,
            VoxelIoError::Parse { .. } => ErrorKind::Parse,
            VoxelIoError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            VoxelIoError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
        }
    }

    /// The file or resource path this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            VoxelIoError::FileOpen { path, .. }
            | VoxelIoError::FileRead { path, .. }
            | VoxelIoError::FileWrite { path, .. }
            | VoxelIoError::DataTruncated { path, .. }
            | VoxelIoError::Parse { path, .. }
            | VoxelIoError::UnsupportedFormat { path } => Some(path),
            VoxelIoError::InvalidArgument(_) => None,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        VoxelIoError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        VoxelIoError::DataTruncated {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Specialized Result type for volume IO operations
pub type Result<T> = std::result::Result<T, VoxelIoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = VoxelIoError::parse("a.nrrd", "bad key");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.path().unwrap(), Path::new("a.nrrd"));

        let err = VoxelIoError::InvalidArgument("volume is empty".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.path().is_none());
    }

    #[test]
    fn test_display_includes_path_and_reason() {
        let err = VoxelIoError::truncated("vol.mha", "expected 64 bytes, got 12");
        let msg = err.to_string();
        assert!(msg.contains("vol.mha"));
        assert!(msg.contains("expected 64 bytes"));
    }
}
