// src/fs/mock.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Result};

use super::FileSystem;

#[derive(Debug, Clone)]
struct MockFile {
    contents: Vec<u8>,
    mtime: SystemTime,
}

/// In-memory filesystem with fully controllable modification times.
///
/// Writes stamp files with a monotonically increasing internal clock that
/// starts well above any timestamp seeded with [`add_file_at`], so a file
/// written during a simulated build always looks newer than the fixture
/// files set up before it.
///
/// [`add_file_at`]: MockFileSystem::add_file_at
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockFile>>>,
    clock: Arc<AtomicU64>,
}

/// Seconds-since-epoch base for the internal write clock.
const CLOCK_BASE_SECS: u64 = 1_000_000;

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(AtomicU64::new(CLOCK_BASE_SECS)),
        }
    }

    /// Insert a file whose mtime is `secs` seconds after the epoch.
    ///
    /// Keep fixture values below `1_000_000` so later writes are newer.
    pub fn add_file_at(&self, path: impl AsRef<Path>, secs: u64) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                contents: Vec::new(),
                mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            },
        );
    }

    /// Insert a file with contents, stamped by the internal clock.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let mtime = self.tick();
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                contents: contents.into(),
                mtime,
            },
        );
    }

    /// Re-stamp an existing file with `secs` seconds after the epoch.
    pub fn set_mtime(&self, path: impl AsRef<Path>, secs: u64) {
        let mut files = self.files.lock().unwrap();
        if let Some(file) = files.get_mut(path.as_ref()) {
            file.mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        }
    }

    fn tick(&self) -> SystemTime {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst);
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(file) => String::from_utf8(file.contents.clone())
                .map_err(|e| anyhow!("invalid UTF-8 in {:?}: {}", path, e)),
            None => Err(anyhow!("file not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mtime = self.tick();
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.to_path_buf(),
            MockFile {
                contents: contents.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn mtime(&self, path: &Path) -> Result<SystemTime> {
        let files = self.files.lock().unwrap();
        files
            .get(path)
            .map(|file| file.mtime)
            .ok_or_else(|| anyhow!("file not found: {:?}", path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("file not found: {:?}", path))
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        // Directories are implicit in the mock.
        Ok(())
    }
}
