//! Mutation journals.
//!
//! A journal is an **opaque line sink**: the store appends one encoded
//! record per mutation and the journal makes it durable (or not). The
//! store owns all record interpretation; journals do not understand
//! tasks, ledger entries, or users.

use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use taskrelay_core::{CoreError, CoreResult};

/// The durable collections the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Task records.
    Tasks,
    /// Pending-operation ledger entries.
    Ledger,
    /// Registered users.
    Users,
}

impl Collection {
    /// Log file name for this collection.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks.log",
            Self::Ledger => "ledger.log",
            Self::Users => "users.log",
        }
    }
}

/// A sink for encoded mutation records.
///
/// # Invariants
///
/// - `append` returns only after the record is as durable as the
///   journal promises (nothing for [`NullJournal`], flushed and by
///   default fsynced for [`FileJournal`])
/// - Lines are appended in call order
pub trait Journal: Send + Sync {
    /// Appends one encoded record to the collection's log.
    fn append(&self, collection: Collection, line: &str) -> CoreResult<()>;
}

/// A journal that keeps nothing.
///
/// Used by the in-memory store for tests and the no-database dev mode.
#[derive(Debug, Default)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn append(&self, _collection: Collection, _line: &str) -> CoreResult<()> {
        Ok(())
    }
}

/// Configuration for opening a file-backed store.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,
    /// Whether to fsync the log on every mutation (safer but slower).
    pub sync_on_commit: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

/// Append-only file journal: one JSON-lines log per collection under a
/// data directory, guarded by an exclusive lock file.
///
/// Data survives process restarts; a second process trying to open the
/// same directory fails fast instead of corrupting the logs.
pub struct FileJournal {
    dir: PathBuf,
    files: Mutex<LogFiles>,
    sync_on_commit: bool,
    // Held for the journal's lifetime; the OS releases the lock when the
    // file handle closes.
    _lock: File,
}

struct LogFiles {
    tasks: File,
    ledger: File,
    users: File,
}

impl LogFiles {
    fn for_collection(&mut self, collection: Collection) -> &mut File {
        match collection {
            Collection::Tasks => &mut self.tasks,
            Collection::Ledger => &mut self.ledger,
            Collection::Users => &mut self.users,
        }
    }
}

impl FileJournal {
    /// Opens the journal at `dir`, creating the directory per config.
    ///
    /// # Errors
    ///
    /// Fails if the directory is missing (and `create_if_missing` is
    /// off), cannot be created, or is locked by another process.
    pub fn open(dir: &Path, config: &FileStoreConfig) -> CoreResult<Self> {
        if config.create_if_missing {
            std::fs::create_dir_all(dir)?;
        } else if !dir.is_dir() {
            return Err(CoreError::storage(format!(
                "data directory {} does not exist",
                dir.display()
            )));
        }

        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join("LOCK"))?;
        lock.try_lock_exclusive().map_err(|_| {
            CoreError::storage(format!(
                "data directory {} is locked by another process",
                dir.display()
            ))
        })?;

        let open_log = |name: &str| -> CoreResult<File> {
            Ok(OpenOptions::new()
                .append(true)
                .create(true)
                .open(dir.join(name))?)
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            files: Mutex::new(LogFiles {
                tasks: open_log(Collection::Tasks.file_name())?,
                ledger: open_log(Collection::Ledger.file_name())?,
                users: open_log(Collection::Users.file_name())?,
            }),
            sync_on_commit: config.sync_on_commit,
            _lock: lock,
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the raw lines of a collection's log, oldest first.
    ///
    /// A missing log file is an empty collection, not an error. Called
    /// before `open` takes the append handles, during state replay.
    pub fn read_log(dir: &Path, collection: Collection) -> CoreResult<Vec<String>> {
        let path = dir.join(collection.file_name());
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect())
    }
}

impl Journal for FileJournal {
    fn append(&self, collection: Collection, line: &str) -> CoreResult<()> {
        let mut files = self.files.lock();
        let file = files.for_collection(collection);
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        if self.sync_on_commit {
            file.sync_data()?;
        }
        Ok(())
    }
}
