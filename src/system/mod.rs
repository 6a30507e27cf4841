//! Collaborator abstractions for testing and development

pub mod callbacks;
pub mod error;
pub mod filesystem;
pub mod preferences;

// Re-export commonly used traits
pub use callbacks::{CallRecorder, Callback, RecordingCallback};
pub use error::{FsError, FsResult, PrefResult, PreferenceError};
pub use filesystem::{FileSystem, MemoryFileSystem, RealFileSystem};
pub use preferences::{FilePreferenceStore, InMemoryPreferenceStore, PreferenceStore};
