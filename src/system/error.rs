use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by preference store implementations
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Reading or writing the backing file failed
    #[error("Preference file {operation} failed for path: {}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Backing file exists but does not hold a preference document
    #[error("Preference file {} is not valid JSON", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Stored value has a different type than the accessor asked for
    #[error("Preference '{key}' holds {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Store answered a write with "not accepted"
    #[error("Preference store rejected the write to '{key}'")]
    WriteRejected { key: String },
}

impl PreferenceError {
    /// Create an I/O error for the preference file
    pub fn io(path: &Path, operation: &'static str, source: std::io::Error) -> Self {
        PreferenceError::Io {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }

    /// Create a corrupt-file error
    pub fn corrupt(path: &Path, source: serde_json::Error) -> Self {
        PreferenceError::Corrupt {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(key: &str, expected: &'static str, found: &'static str) -> Self {
        PreferenceError::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }

    /// Create a rejected-write error
    pub fn write_rejected(key: &str) -> Self {
        PreferenceError::WriteRejected {
            key: key.to_string(),
        }
    }
}

/// Result type alias for preference operations
pub type PrefResult<T> = Result<T, PreferenceError>;

/// Errors raised by filesystem implementations
#[derive(Debug, Error)]
pub enum FsError {
    /// Parent directory does not exist and creation was not recursive
    #[error("Cannot create {}: parent directory does not exist", path.display())]
    ParentMissing { path: PathBuf },

    /// A path component that must be a directory is a file
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Path that must be a file is a directory
    #[error("Is a directory: {}", path.display())]
    IsADirectory { path: PathBuf },

    /// Nothing exists at the path
    #[error("No such file or directory: {}", path.display())]
    NotFound { path: PathBuf },

    /// Underlying OS error
    #[error("Filesystem {operation} failed for path: {}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub fn parent_missing(path: &Path) -> Self {
        FsError::ParentMissing {
            path: path.to_path_buf(),
        }
    }

    pub fn not_a_directory(path: &Path) -> Self {
        FsError::NotADirectory {
            path: path.to_path_buf(),
        }
    }

    pub fn is_a_directory(path: &Path) -> Self {
        FsError::IsADirectory {
            path: path.to_path_buf(),
        }
    }

    pub fn not_found(path: &Path) -> Self {
        FsError::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// Wrap an OS error, mapping `NotFound` onto the dedicated variant
    pub fn io(path: &Path, operation: &'static str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return FsError::not_found(path);
        }
        FsError::Io {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }
}

/// Result type alias for filesystem operations
pub type FsResult<T> = Result<T, FsError>;
