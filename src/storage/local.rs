//! Local filesystem watermark store.
//!
//! The tracker file holds one line of epoch seconds. Updates go to a sibling
//! temporary file that is synced and renamed over the tracker, so a crash at
//! any point leaves either the old or the new value on disk, never a partial
//! one. A sibling `.lock` file carries an exclusive `flock` for the whole
//! read-compare-write sequence.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{AppError, Result};
use crate::models::Watermark;
use crate::storage::{Advance, WatermarkStore};

/// Watermark store backed by a single tracker file.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    /// Create a store for the given tracker file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> AppError {
        AppError::watermark(&self.path, source)
    }

    /// Ensure parent directory exists.
    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        Ok(())
    }

    /// Create the lock file if needed and block until the exclusive lock is held.
    ///
    /// The lock is released when the returned handle is dropped.
    fn lock_exclusive(&self) -> Result<File> {
        self.ensure_dir()?;
        let lock_path = self.sibling(".lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| AppError::watermark(&lock_path, e))?;

        FileExt::lock_exclusive(&lock_file).map_err(|e| AppError::watermark(&lock_path, e))?;
        Ok(lock_file)
    }

    /// Take a shared lock on an existing lock file without creating anything.
    ///
    /// Returns `None` when the lock file cannot be opened, e.g. on a
    /// read-only state directory or a tracker no writer has locked yet.
    fn lock_shared(&self) -> Result<Option<File>> {
        let lock_path = self.sibling(".lock");
        let lock_file = match OpenOptions::new().read(true).open(&lock_path) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("Reading {} unlocked: {}", self.path.display(), e);
                return Ok(None);
            }
        };

        FileExt::lock_shared(&lock_file).map_err(|e| AppError::watermark(&lock_path, e))?;
        Ok(Some(lock_file))
    }

    /// Read the tracker. Caller must hold the lock.
    fn read_value(&self) -> Result<Option<Watermark>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No tracker at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let first_line = content.lines().next().unwrap_or("");
        let value = Watermark::parse_stored(first_line);
        if value.is_none() && !first_line.trim().is_empty() {
            log::warn!(
                "Ignoring unreadable tracker value {:?} in {}",
                first_line.trim(),
                self.path.display()
            );
        }
        Ok(value)
    }

    /// Durably replace the tracker value. Caller must hold the exclusive lock.
    fn write_value(&self, watermark: Watermark) -> Result<()> {
        let tmp = self.sibling(".tmp");

        let mut file = File::create(&tmp).map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", watermark.epoch()).map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        self.sync_parent();
        Ok(())
    }

    /// Persist the rename itself. Best effort: not every platform allows
    /// opening a directory for syncing.
    fn sync_parent(&self) {
        #[cfg(unix)]
        if let Some(parent) = self.path.parent() {
            let dir = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
                log::debug!("Could not sync {}: {}", dir.display(), e);
            }
        }
    }
}

impl WatermarkStore for FileWatermarkStore {
    fn load(&self) -> Result<Option<Watermark>> {
        // The tracker is only ever replaced by rename, so an unlocked read
        // still sees a whole value.
        if !self.path.exists() {
            log::info!("No tracker at {}", self.path.display());
            return Ok(None);
        }
        let _lock = self.lock_shared()?;
        self.read_value()
    }

    fn compare_and_advance(&self, newest: Watermark) -> Result<Advance> {
        let _lock = self.lock_exclusive()?;

        let advance = match self.read_value()? {
            Some(stored) if stored == newest => Advance::Unchanged,
            Some(stored) if newest < stored => Advance::Regressed { stored },
            Some(previous) => {
                self.write_value(newest)?;
                Advance::Advanced { previous }
            }
            None => {
                self.write_value(newest)?;
                Advance::Baseline
            }
        };

        log::debug!("Tracker {}: {:?}", self.path.display(), advance);
        Ok(advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> FileWatermarkStore {
        FileWatermarkStore::new(tmp.path().join("state").join("tracker"))
    }

    #[test]
    fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(store(&tmp).load().unwrap(), None);
    }

    #[test]
    fn test_load_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().parent().unwrap().exists());

        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "1704103200\n").unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(Watermark::from_epoch(1_704_103_200))
        );
        assert!(!store.sibling(".lock").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_from_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let dir = store.path().parent().unwrap().to_path_buf();
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path(), "1704103200\n").unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        let loaded = store.load();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(loaded.unwrap(), Some(Watermark::from_epoch(1_704_103_200)));
    }

    #[test]
    fn test_first_run_stores_baseline() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let advance = store.compare_and_advance(Watermark::from_epoch(100)).unwrap();
        assert_eq!(advance, Advance::Baseline);
        assert_eq!(advance.previous(), None);
        assert_eq!(store.load().unwrap(), Some(Watermark::from_epoch(100)));
    }

    #[test]
    fn test_unchanged_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.compare_and_advance(Watermark::from_epoch(100)).unwrap();

        for _ in 0..3 {
            let advance = store.compare_and_advance(Watermark::from_epoch(100)).unwrap();
            assert_eq!(advance, Advance::Unchanged);
            assert_eq!(advance.previous(), None);
        }
    }

    #[test]
    fn test_advance_returns_previous() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.compare_and_advance(Watermark::from_epoch(100)).unwrap();

        let advance = store.compare_and_advance(Watermark::from_epoch(200)).unwrap();
        assert_eq!(advance.previous(), Some(Watermark::from_epoch(100)));
        assert_eq!(store.load().unwrap(), Some(Watermark::from_epoch(200)));
        assert!(!store.sibling(".tmp").exists());
    }

    #[test]
    fn test_never_moves_backwards() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.compare_and_advance(Watermark::from_epoch(200)).unwrap();

        let advance = store.compare_and_advance(Watermark::from_epoch(150)).unwrap();
        assert_eq!(
            advance,
            Advance::Regressed {
                stored: Watermark::from_epoch(200)
            }
        );
        assert_eq!(store.load().unwrap(), Some(Watermark::from_epoch(200)));
    }

    #[test]
    fn test_corrupt_tracker_treated_as_first_run() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not-a-number\n").unwrap();

        assert_eq!(store.load().unwrap(), None);
        let advance = store.compare_and_advance(Watermark::from_epoch(300)).unwrap();
        assert_eq!(advance, Advance::Baseline);
    }

    #[test]
    fn test_out_of_range_tracker_does_not_pin_watermark() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "1e30\n").unwrap();

        assert_eq!(store.load().unwrap(), None);
        let advance = store
            .compare_and_advance(Watermark::from_epoch(1_704_106_800))
            .unwrap();
        assert_eq!(advance, Advance::Baseline);
        assert_eq!(
            store.load().unwrap(),
            Some(Watermark::from_epoch(1_704_106_800))
        );
    }

    #[test]
    fn test_reads_legacy_float_value() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "1704103200.0").unwrap();

        // two days later, ahead of any host offset applied to the legacy value
        let advance = store
            .compare_and_advance(Watermark::from_epoch(1_704_276_000))
            .unwrap();
        assert_eq!(advance.previous(), Watermark::parse_stored("1704103200.0"));
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "1704276000\n"
        );
    }

    #[test]
    fn test_concurrent_advances_report_previous_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tracker");
        FileWatermarkStore::new(&path)
            .compare_and_advance(Watermark::from_epoch(100))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = FileWatermarkStore::new(&path);
                std::thread::spawn(move || store.compare_and_advance(Watermark::from_epoch(200)))
            })
            .collect();

        let advanced = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .filter(|advance| advance.previous().is_some())
            .count();
        assert_eq!(advanced, 1);
    }
}
