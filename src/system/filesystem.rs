use super::error::{FsError, FsResult};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Abstraction for filesystem access to enable testing without real files
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    /// Create an empty file; an existing file is left untouched
    fn create_file(&self, path: &str, recursive: bool) -> FsResult<()>;
    fn create_dir(&self, path: &str, recursive: bool) -> FsResult<()>;
    fn exists(&self, path: &str) -> bool;
    fn read_to_string(&self, path: &str) -> FsResult<String>;
    /// Replace file contents; the parent directory must exist
    fn write_string(&self, path: &str, contents: &str) -> FsResult<()>;
    fn remove(&self, path: &str) -> FsResult<()>;
}

/// Real filesystem using std::fs
pub struct RealFileSystem;

impl RealFileSystem {
    fn ensure_parent(path: &Path, recursive: bool) -> FsResult<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        if parent.is_dir() {
            return Ok(());
        }
        if parent.exists() {
            return Err(FsError::not_a_directory(parent));
        }
        if !recursive {
            return Err(FsError::parent_missing(path));
        }
        if let Some(blocker) = parent.ancestors().find(|a| a.is_file()) {
            return Err(FsError::not_a_directory(blocker));
        }
        std::fs::create_dir_all(parent).map_err(|e| FsError::io(parent, "create directory", e))
    }
}

impl FileSystem for RealFileSystem {
    fn create_file(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = Path::new(path);
        if path.is_dir() {
            return Err(FsError::is_a_directory(path));
        }
        if path.is_file() {
            return Ok(());
        }
        Self::ensure_parent(path, recursive)?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(|_| ())
            .map_err(|e| FsError::io(path, "create", e))
    }

    fn create_dir(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = Path::new(path);
        if path.is_dir() {
            return Ok(());
        }
        if path.exists() {
            return Err(FsError::not_a_directory(path));
        }
        Self::ensure_parent(path, recursive)?;
        std::fs::create_dir(path).map_err(|e| FsError::io(path, "create directory", e))
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn read_to_string(&self, path: &str) -> FsResult<String> {
        let path = Path::new(path);
        if path.is_dir() {
            return Err(FsError::is_a_directory(path));
        }
        std::fs::read_to_string(path).map_err(|e| FsError::io(path, "read", e))
    }

    fn write_string(&self, path: &str, contents: &str) -> FsResult<()> {
        let path = Path::new(path);
        if path.is_dir() {
            return Err(FsError::is_a_directory(path));
        }
        Self::ensure_parent(path, false)?;
        std::fs::write(path, contents).map_err(|e| FsError::io(path, "write", e))
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        let path = Path::new(path);
        if path.is_dir() {
            std::fs::remove_dir_all(path).map_err(|e| FsError::io(path, "remove", e))
        } else {
            std::fs::remove_file(path).map_err(|e| FsError::io(path, "remove", e))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    File(String),
    Dir,
}

/// In-memory filesystem for tests and demo mode.
///
/// Paths are normalised lexically: `.` is dropped, `..` pops a component and
/// relative paths are anchored at `/`. The root directory always exists.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    entries: Mutex<BTreeMap<PathBuf, Entry>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a file, creating its ancestors
    pub fn with_file(self, path: &str, contents: &str) -> Self {
        {
            let mut entries = self.lock();
            let path = normalize(path);
            insert_ancestors(&mut entries, &path);
            entries.insert(path, Entry::File(contents.to_string()));
        }
        self
    }

    /// All files currently stored, sorted by path
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_parent(
        entries: &mut BTreeMap<PathBuf, Entry>,
        path: &Path,
        recursive: bool,
    ) -> FsResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        match lookup(entries, parent) {
            Some(Entry::Dir) => Ok(()),
            Some(Entry::File(_)) => Err(FsError::not_a_directory(parent)),
            None if recursive => {
                if let Some(blocker) = parent
                    .ancestors()
                    .find(|a| matches!(lookup(entries, a), Some(Entry::File(_))))
                {
                    return Err(FsError::not_a_directory(blocker));
                }
                insert_ancestors(entries, path);
                Ok(())
            }
            None => Err(FsError::parent_missing(path)),
        }
    }
}

fn normalize(path: &str) -> PathBuf {
    let mut normalized = PathBuf::from("/");
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                normalized.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    normalized
}

static ROOT: Entry = Entry::Dir;

fn lookup<'a>(entries: &'a BTreeMap<PathBuf, Entry>, path: &Path) -> Option<&'a Entry> {
    if path.parent().is_none() {
        return Some(&ROOT);
    }
    entries.get(path)
}

fn insert_ancestors(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.parent().is_some() {
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Dir);
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn create_file(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = normalize(path);
        let mut entries = self.lock();
        match lookup(&entries, &path) {
            Some(Entry::File(_)) => return Ok(()),
            Some(Entry::Dir) => return Err(FsError::is_a_directory(&path)),
            None => {}
        }
        Self::check_parent(&mut entries, &path, recursive)?;
        debug!(path = %path.display(), "creating in-memory file");
        entries.insert(path, Entry::File(String::new()));
        Ok(())
    }

    fn create_dir(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = normalize(path);
        let mut entries = self.lock();
        match lookup(&entries, &path) {
            Some(Entry::Dir) => return Ok(()),
            Some(Entry::File(_)) => return Err(FsError::not_a_directory(&path)),
            None => {}
        }
        Self::check_parent(&mut entries, &path, recursive)?;
        entries.insert(path, Entry::Dir);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        lookup(&self.lock(), &normalize(path)).is_some()
    }

    fn read_to_string(&self, path: &str) -> FsResult<String> {
        let path = normalize(path);
        match lookup(&self.lock(), &path) {
            Some(Entry::File(contents)) => Ok(contents.clone()),
            Some(Entry::Dir) => Err(FsError::is_a_directory(&path)),
            None => Err(FsError::not_found(&path)),
        }
    }

    fn write_string(&self, path: &str, contents: &str) -> FsResult<()> {
        let path = normalize(path);
        let mut entries = self.lock();
        if let Some(Entry::Dir) = lookup(&entries, &path) {
            return Err(FsError::is_a_directory(&path));
        }
        Self::check_parent(&mut entries, &path, false)?;
        entries.insert(path, Entry::File(contents.to_string()));
        Ok(())
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        let path = normalize(path);
        let mut entries = self.lock();
        if entries.remove(&path).is_none() {
            return Err(FsError::not_found(&path));
        }
        entries.retain(|p, _| !p.starts_with(&path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_create_file_requires_parent() {
        let fs = MemoryFileSystem::new();

        let err = fs.create_file("/data/logs/app.log", false).unwrap_err();
        assert!(matches!(err, FsError::ParentMissing { .. }));
        assert!(!fs.exists("/data/logs/app.log"));
    }

    #[test]
    fn test_memory_create_file_recursive() {
        let fs = MemoryFileSystem::new();

        fs.create_file("/data/logs/app.log", true).unwrap();

        assert!(fs.exists("/data/logs/app.log"));
        assert!(fs.exists("/data/logs"));
        assert!(fs.exists("/data"));
        assert_eq!(fs.read_to_string("/data/logs/app.log").unwrap(), "");
    }

    #[test]
    fn test_memory_create_existing_file_keeps_contents() {
        let fs = MemoryFileSystem::new().with_file("/notes.txt", "hello");

        fs.create_file("/notes.txt", false).unwrap();

        assert_eq!(fs.read_to_string("/notes.txt").unwrap(), "hello");
    }

    #[test]
    fn test_memory_file_as_parent_is_rejected() {
        let fs = MemoryFileSystem::new().with_file("/a", "");

        let err = fs.create_file("/a/b/c.txt", true).unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }

    #[test]
    fn test_memory_paths_are_normalized() {
        let fs = MemoryFileSystem::new();
        fs.create_file("docs/./readme.md", true).unwrap();

        assert!(fs.exists("/docs/readme.md"));
        assert!(fs.exists("/docs/../docs/readme.md"));
        assert!(fs.exists("/"));
    }

    #[test]
    fn test_memory_write_read_remove() {
        let fs = MemoryFileSystem::new();
        fs.create_dir("/tmp", false).unwrap();
        fs.write_string("/tmp/a.txt", "one").unwrap();
        fs.write_string("/tmp/a.txt", "two").unwrap();
        assert_eq!(fs.read_to_string("/tmp/a.txt").unwrap(), "two");

        fs.remove("/tmp").unwrap();
        assert!(!fs.exists("/tmp/a.txt"));
        assert!(fs.files().is_empty());
        assert!(matches!(fs.remove("/tmp"), Err(FsError::NotFound { .. })));
    }

    #[test]
    fn test_memory_read_directory_fails() {
        let fs = MemoryFileSystem::new();
        fs.create_dir("/var/cache", true).unwrap();

        assert!(matches!(
            fs.read_to_string("/var/cache"),
            Err(FsError::IsADirectory { .. })
        ));
    }

    #[test]
    fn test_real_create_file_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("file.txt");
        let target = target.to_str().unwrap();
        let fs = RealFileSystem;

        assert!(matches!(
            fs.create_file(target, false),
            Err(FsError::ParentMissing { .. })
        ));
        fs.create_file(target, true).unwrap();
        assert!(fs.exists(target));

        fs.write_string(target, "content").unwrap();
        fs.create_file(target, false).unwrap();
        assert_eq!(fs.read_to_string(target).unwrap(), "content");
    }

    #[test]
    fn test_real_file_as_parent_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("a");
        std::fs::write(&blocker, "").unwrap();
        let target = blocker.join("b").join("c.txt");

        let err = RealFileSystem
            .create_file(target.to_str().unwrap(), true)
            .unwrap_err();

        assert!(matches!(err, FsError::NotADirectory { ref path } if *path == blocker));
        assert!(!blocker.join("b").exists());
    }

    #[test]
    fn test_real_remove_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing.txt");

        let err = RealFileSystem.remove(target.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
