use crate::system::{FileSystem, FsResult};
use tracing::info;

/// File bootstrap helpers over an injected filesystem
pub struct FileService<F: FileSystem> {
    filesystem: F,
}

impl<F: FileSystem> FileService<F> {
    pub fn new(filesystem: F) -> Self {
        Self { filesystem }
    }

    /// Create `path` and any missing parent directories
    pub fn ensure_file(&self, path: &str) -> FsResult<()> {
        self.filesystem.create_file(path, true)?;
        info!(path, "file ensured");
        Ok(())
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.filesystem.exists(path)
    }

    /// Create the file if needed and replace its contents
    pub fn write_note(&self, path: &str, text: &str) -> FsResult<()> {
        self.ensure_file(path)?;
        self.filesystem.write_string(path, text)
    }

    pub fn read_note(&self, path: &str) -> FsResult<String> {
        self.filesystem.read_to_string(path)
    }

    pub fn filesystem(&self) -> &F {
        &self.filesystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::FsError;
    use crate::system::filesystem::MockFileSystem;
    use mockall::predicate::eq;
    use std::path::Path;

    #[test]
    fn test_ensure_file_creates_recursively() {
        let mut filesystem = MockFileSystem::new();
        filesystem
            .expect_create_file()
            .with(eq("/data/app/config.json"), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = FileService::new(filesystem);

        service.ensure_file("/data/app/config.json").unwrap();
    }

    #[test]
    fn test_filesystem_errors_propagate() {
        let mut filesystem = MockFileSystem::new();
        filesystem
            .expect_create_file()
            .returning(|path, _| Err(FsError::not_a_directory(Path::new(path))));
        filesystem.expect_write_string().never();

        let service = FileService::new(filesystem);

        assert!(matches!(
            service.write_note("/blocked/note.txt", "text"),
            Err(FsError::NotADirectory { .. })
        ));
    }
}
