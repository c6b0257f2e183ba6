//! # File I/O Module
//!
//! Handles library file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent two processes from editing one library
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Libraries are saved as `.qvr` (Quiver) files containing JSON.
//! Lock files use the `.qvr.lock` extension with metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quiver_core::file_io::{save_library, load_library, FileLock};
//! use quiver_core::library::BuildLibrary;
//! use std::path::Path;
//!
//! let library = BuildLibrary::new();
//! let path = Path::new("builds.qvr");
//!
//! // Acquire lock before saving
//! let lock = FileLock::acquire(path, "archer@example.com").unwrap();
//!
//! // Save with atomic write
//! save_library(&library, path).unwrap();
//!
//! // Lock is released when dropped
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{BuildError, BuildResult};
use crate::library::{BuildLibrary, SCHEMA_VERSION};

/// Lock file metadata stored in .qvr.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. .lock file with metadata for user visibility
pub struct FileLock {
    /// Path to the library file
    library_path: PathBuf,
    /// The underlying file handle (keeps OS lock)
    lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a library file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(BuildError::FileLocked)` - Another process holds the lock
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use quiver_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("builds.qvr"), "archer@example.com")?;
    /// // ... do work ...
    /// drop(lock); // releases lock
    /// # Ok::<(), quiver_core::errors::BuildError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> BuildResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        // Never truncate before holding the OS lock: the file may carry the
        // current holder's metadata.
        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        // Non-blocking: fail fast if another process holds the OS lock
        if FileExt::try_lock_exclusive(&lock_file).is_err() {
            let holder = read_lock_info(&lock_path).ok();
            return Err(BuildError::file_locked(
                path.display().to_string(),
                holder
                    .as_ref()
                    .map(|h| format!("{} ({})", h.user_id, h.machine))
                    .unwrap_or_else(|| "another process".to_string()),
                holder
                    .map(|h| h.locked_at.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        // A clean release empties the file, so metadata here means the
        // previous holder exited without releasing.
        let mut previous = String::new();
        lock_file
            .read_to_string(&mut previous)
            .map_err(io_error("read lock", &lock_path))?;
        if let Ok(previous) = serde_json::from_str::<LockInfo>(&previous) {
            warn!(
                path = %path.display(),
                holder = %previous.user_id,
                pid = previous.pid,
                "taking over lock left by an exited process"
            );
        }

        let lock_json = serde_json::to_string_pretty(&info).map_err(BuildError::serialization)?;

        lock_file.set_len(0).map_err(io_error("reset lock", &lock_path))?;
        lock_file.seek(SeekFrom::Start(0)).map_err(io_error("reset lock", &lock_path))?;
        lock_file.write_all(lock_json.as_bytes()).map_err(io_error("write lock", &lock_path))?;
        lock_file.sync_all().map_err(io_error("sync lock", &lock_path))?;

        debug!(path = %path.display(), user = %info.user_id, "lock acquired");
        Ok(FileLock {
            library_path: path.to_path_buf(),
            lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if another handle holds the lock, `None` if
    /// available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        let file = File::open(&lock_path).ok()?;
        if FileExt::try_lock_shared(&file).is_ok() {
            let _ = FileExt::unlock(&file);
            return None;
        }
        read_lock_info(&lock_path).ok()
    }

    /// Get the path to the library file
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Never unlink: every contender must lock the same inode.
        // An empty lock file marks a clean release.
        let _ = self.lock_file.set_len(0);
        let _ = FileExt::unlock(&self.lock_file);
    }
}

/// Get the lock file path for a library file
fn lock_path_for(library_path: &Path) -> PathBuf {
    with_suffix(library_path, "lock")
}

/// Get the temp file path used during atomic saves
fn tmp_path_for(library_path: &Path) -> PathBuf {
    with_suffix(library_path, "tmp")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    let extension = out
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    out.set_extension(extension);
    out
}

/// Read lock info from a lock file
fn read_lock_info(lock_path: &Path) -> BuildResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(BuildError::serialization)
}

fn read_to_string(path: &Path, operation: &str) -> BuildResult<String> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(io_error(operation, path))?;
    Ok(contents)
}

/// Map an I/O failure on `path` to a [`BuildError::FileError`]
fn io_error<'a>(operation: &'a str, path: &'a Path) -> impl FnOnce(std::io::Error) -> BuildError + 'a {
    move |e| BuildError::file_error(operation, path.display().to_string(), e.to_string())
}

/// Save a library to a file with atomic write semantics.
///
/// The save process:
/// 1. Serialize library to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename .tmp over the target (atomic on most filesystems)
///
/// # Example
///
/// ```rust,no_run
/// use quiver_core::file_io::save_library;
/// use quiver_core::library::BuildLibrary;
/// use std::path::Path;
///
/// let library = BuildLibrary::new();
/// save_library(&library, Path::new("builds.qvr"))?;
/// # Ok::<(), quiver_core::errors::BuildError>(())
/// ```
pub fn save_library(library: &BuildLibrary, path: &Path) -> BuildResult<()> {
    let json = serde_json::to_string_pretty(library).map_err(BuildError::serialization)?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;

    tmp_file.write_all(json.as_bytes()).map_err(io_error("write temp file", &tmp_path))?;

    tmp_file.sync_all().map_err(io_error("sync temp file", &tmp_path))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        BuildError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), builds = library.build_count(), "library saved");
    Ok(())
}

/// Load a library from a file.
///
/// # Returns
///
/// * `Ok(BuildLibrary)` - Successfully loaded library
/// * `Err(BuildError::VersionMismatch)` - File version is incompatible
/// * `Err(BuildError::SerializationError)` - Invalid JSON
/// * `Err(BuildError::FileError)` - I/O error
pub fn load_library(path: &Path) -> BuildResult<BuildLibrary> {
    let contents = read_to_string(path, "open")?;

    let library: BuildLibrary = serde_json::from_str(&contents).map_err(|e| BuildError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&library.meta.version)?;

    debug!(path = %path.display(), builds = library.build_count(), "library loaded");
    Ok(library)
}

/// Load a library, or start an empty one if the file does not exist yet.
pub fn load_or_create_library(path: &Path) -> BuildResult<BuildLibrary> {
    if path.exists() {
        load_library(path)
    } else {
        debug!(path = %path.display(), "no library file, starting empty");
        Ok(BuildLibrary::new())
    }
}

/// Load a library, returning whether it's read-only due to a lock.
///
/// # Returns
///
/// * `Ok((BuildLibrary, None))` - Loaded successfully, no lock
/// * `Ok((BuildLibrary, Some(LockInfo)))` - Loaded, but another user has the lock
/// * `Err(_)` - Failed to load
pub fn load_library_with_lock_check(path: &Path) -> BuildResult<(BuildLibrary, Option<LockInfo>)> {
    let library = load_library(path)?;
    let lock_info = FileLock::check(path);
    Ok((library, lock_info))
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> BuildResult<()> {
    let mismatch = || BuildError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions, a newer minor may carry breaking changes
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildDraft;
    use tempfile::TempDir;

    fn temp_library_path(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(format!("{}.qvr", name))
    }

    #[test]
    fn test_lock_path_generation() {
        let library_path = Path::new("/path/to/builds.qvr");
        assert_eq!(lock_path_for(library_path), Path::new("/path/to/builds.qvr.lock"));
        assert_eq!(tmp_path_for(library_path), Path::new("/path/to/builds.qvr.tmp"));
        assert_eq!(lock_path_for(Path::new("builds")), Path::new("builds.lock"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("archer@example.com");
        assert_eq!(info.user_id, "archer@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "roundtrip");

        let mut library = BuildLibrary::new();
        let id = library
            .create_build(&BuildDraft::new("Deer").with_component("tip", 100.0), Some("jane"))
            .unwrap();
        save_library(&library, &path).unwrap();

        let loaded = load_library(&path).unwrap();
        assert_eq!(loaded.build_count(), 1);
        let build = loaded.get_build(&id, Some("jane")).unwrap();
        assert_eq!(build.name, "Deer");
        assert_eq!(build.total_grains, 100.0);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "atomic");

        save_library(&BuildLibrary::new(), &path).unwrap();

        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "lock_test");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "archer@example.com").unwrap();
        assert_eq!(lock.info.user_id, "archer@example.com");
        assert_eq!(lock.library_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());
        assert_eq!(FileLock::check(&path).unwrap().user_id, "archer@example.com");

        drop(lock);
        assert!(FileLock::check(&path).is_none());
        assert_eq!(fs::metadata(&lock_path).unwrap().len(), 0);
    }

    #[test]
    fn test_second_acquire_keeps_holder_metadata() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "contended");

        let held = FileLock::acquire(&path, "jane").unwrap();
        let err = FileLock::acquire(&path, "john").err().unwrap();
        assert!(err.is_recoverable());
        match err {
            BuildError::FileLocked { locked_by, .. } => assert!(locked_by.starts_with("jane")),
            other => panic!("expected FileLocked, got {:?}", other),
        }
        assert_eq!(FileLock::check(&path).unwrap().user_id, "jane");

        drop(held);
        let again = FileLock::acquire(&path, "john").unwrap();
        assert_eq!(FileLock::check(&path).unwrap().user_id, again.info.user_id);
    }

    #[test]
    fn test_leftover_metadata_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "crashed");
        let leftover = serde_json::to_string(&LockInfo::new("gone")).unwrap();
        fs::write(lock_path_for(&path), leftover).unwrap();

        let lock = FileLock::acquire(&path, "jane").unwrap();
        assert_eq!(read_lock_info(&lock_path_for(&path)).unwrap().user_id, "jane");
        drop(lock);
    }

    #[test]
    fn test_concurrent_writers_lose_no_builds() {
        const THREADS: usize = 6;
        const SAVES: usize = 15;

        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "race");

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let path = &path;
                scope.spawn(move || {
                    for i in 0..SAVES {
                        let _lock = loop {
                            match FileLock::acquire(path, format!("writer-{}", t)) {
                                Ok(lock) => break lock,
                                Err(e) if e.is_recoverable() => {
                                    std::thread::sleep(std::time::Duration::from_millis(1))
                                }
                                Err(e) => panic!("acquire failed: {:?}", e),
                            }
                        };
                        let mut library = load_or_create_library(path).unwrap();
                        let draft = BuildDraft::new(format!("w{}-{}", t, i)).with_component("tip", 100.0);
                        library.create_build(&draft, None).unwrap();
                        save_library(&library, path).unwrap();
                    }
                });
            }
        });

        assert_eq!(load_library(&path).unwrap().build_count(), THREADS * SAVES);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "future");

        let mut library = BuildLibrary::new();
        library.meta.version = "0.9.0".to_string();
        save_library(&library, &path).unwrap();

        assert!(matches!(
            load_library(&path),
            Err(BuildError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "broken");
        fs::write(&path, "{ not json").unwrap();

        let err = load_library(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_or_create_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "missing");
        let library = load_or_create_library(&path).unwrap();
        assert_eq!(library.build_count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = TempDir::new().unwrap();
        let path = temp_library_path(&dir, "lock_check");
        save_library(&BuildLibrary::new(), &path).unwrap();

        let (loaded, lock_info) = load_library_with_lock_check(&path).unwrap();
        assert_eq!(loaded.build_count(), 0);
        assert!(lock_info.is_none());
    }
}
