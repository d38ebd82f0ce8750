//! Durable, thread-safe collection of [`LayoutRecord`]s.
//!
//! Every mutation updates the in-memory map and hands a full snapshot to a
//! single persist worker, which rewrites the backing file job by job in the
//! order the mutations happened. Callers that need durability wait on the
//! returned [`PersistCompletion`].

use crate::error::StoreError;
use crate::model::LayoutRecord;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

pub const SNAPSHOTS_FILE: &str = "snapshots.json";
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long [`RecordStore::close`] waits for queued writes.
    pub close_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

type RecordMap = HashMap<Uuid, Arc<LayoutRecord>>;

struct PersistJob {
    records: Vec<Arc<LayoutRecord>>,
    done: Sender<Result<(), StoreError>>,
}

/// Resolves once the persist job queued by one mutation has run.
#[must_use = "the mutation is only durable once its completion resolves"]
pub struct PersistCompletion {
    rx: Receiver<Result<(), StoreError>>,
}

impl PersistCompletion {
    /// Blocks until the write finished.
    pub fn wait(self) -> Result<(), StoreError> {
        self.rx.recv().unwrap_or(Err(StoreError::Closed))
    }

    /// Like [`Self::wait`] but gives up after `timeout`, returning `None`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), StoreError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(StoreError::Closed)),
        }
    }
}

pub struct RecordStore {
    path: PathBuf,
    records: RwLock<RecordMap>,
    jobs: Mutex<Option<Sender<PersistJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    close_timeout: Duration,
}

impl RecordStore {
    /// Loads `path` (see [`Self::open_with`]) using default options.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Loads the records stored at `path` and starts the persist worker.
    ///
    /// A missing file yields an empty store. A file that does not decode
    /// (including an empty one) is moved to a timestamped `.json.bak` next to
    /// it before the store starts empty. If that file cannot be read or
    /// backed up, the store starts empty and refuses to write over it: every
    /// persist job fails with [`StoreError::Io`] until the file is removed.
    pub fn open_with(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.into();
        let Loaded {
            records,
            guard_existing,
        } = load_records(&path);
        tracing::info!(path = %path.display(), records = records.len(), "opened record store");

        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        let worker = thread::Builder::new()
            .name("layout-store-persist".into())
            .spawn(move || persist_worker(worker_path, guard_existing, rx))?;

        Ok(Self {
            path,
            records: RwLock::new(records),
            jobs: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            close_timeout: options.close_timeout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records ordered by capture time, oldest first.
    pub fn list(&self) -> Vec<Arc<LayoutRecord>> {
        sorted(&self.read_map())
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<LayoutRecord>> {
        self.read_map().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    pub fn add(&self, record: LayoutRecord) -> Result<PersistCompletion, StoreError> {
        let id = validate_id(record.id())?;
        self.mutate(|records| {
            if records.contains_key(&id) {
                return Err(StoreError::DuplicateKey(id));
            }
            records.insert(id, Arc::new(record));
            Ok(())
        })
    }

    pub fn remove(&self, record: &LayoutRecord) -> Result<PersistCompletion, StoreError> {
        let id = validate_id(record.id())?;
        self.mutate(|records| match records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        })
    }

    pub fn clear(&self) -> Result<PersistCompletion, StoreError> {
        self.mutate(|records| {
            records.clear();
            Ok(())
        })
    }

    /// Stops accepting writes and waits, up to the configured timeout, for
    /// queued ones to finish. Safe to call more than once.
    pub fn close(&self) {
        drop(self.lock_jobs().take());
        let Some(handle) = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return;
        };

        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(handle.join());
        });

        match done_rx.recv_timeout(self.close_timeout) {
            Ok(Ok(())) => {
                tracing::debug!(path = %self.path.display(), "record store closed");
            }
            Ok(Err(_)) => {
                tracing::error!(path = %self.path.display(), "persist worker panicked");
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    path = %self.path.display(),
                    timeout_ms = self.close_timeout.as_millis() as u64,
                    "persist worker did not drain in time; latest changes may be lost"
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::error!(path = %self.path.display(), "persist worker join channel disconnected");
            }
        }
    }

    /// Applies `change` and queues one snapshot while the map is still
    /// locked, so queue order matches mutation order.
    fn mutate<F>(&self, change: F) -> Result<PersistCompletion, StoreError>
    where
        F: FnOnce(&mut RecordMap) -> Result<(), StoreError>,
    {
        let mut records = self.write_map();
        let jobs = self.lock_jobs();
        let sender = jobs.as_ref().ok_or(StoreError::Closed)?;
        change(&mut records)?;

        let (done, rx) = mpsc::channel();
        let job = PersistJob {
            records: sorted(&records),
            done,
        };
        if let Err(mpsc::SendError(job)) = sender.send(job) {
            tracing::error!("persist worker is gone; change kept in memory only");
            let _ = job.done.send(Err(StoreError::Closed));
        }
        Ok(PersistCompletion { rx })
    }

    fn read_map(&self) -> RwLockReadGuard<'_, RecordMap> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, RecordMap> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_jobs(&self) -> MutexGuard<'_, Option<Sender<PersistJob>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate_id(id: Uuid) -> Result<Uuid, StoreError> {
    if id.is_nil() {
        return Err(StoreError::Validation("record id is nil".into()));
    }
    Ok(id)
}

fn sorted(records: &RecordMap) -> Vec<Arc<LayoutRecord>> {
    let mut list: Vec<Arc<LayoutRecord>> = records.values().cloned().collect();
    list.sort_by(|a, b| {
        a.captured_at()
            .cmp(&b.captured_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    list
}

fn persist_worker(path: PathBuf, mut guard_existing: bool, jobs: Receiver<PersistJob>) {
    for job in jobs {
        let result = write_guarded(&path, &mut guard_existing, &job.records);
        match &result {
            Ok(()) => tracing::debug!(records = job.records.len(), "persisted records"),
            Err(err) => tracing::error!(path = %path.display(), "failed to persist records: {err}"),
        }
        let _ = job.done.send(result);
    }
}

/// Writes `records` unless `guard_existing` is set and a file is still at
/// `path`. The guard lifts once that file is gone.
fn write_guarded(
    path: &Path,
    guard_existing: &mut bool,
    records: &[Arc<LayoutRecord>],
) -> Result<(), StoreError> {
    if *guard_existing {
        if !matches!(path.try_exists(), Ok(false)) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "{} could not be loaded or backed up; move it away to resume saving",
                    path.display()
                ),
            )));
        }
        tracing::info!(path = %path.display(), "unloaded record file is gone; saving resumes");
        *guard_existing = false;
    }
    write_records(path, records)
}

fn write_records(path: &Path, records: &[Arc<LayoutRecord>]) -> Result<(), StoreError> {
    let records: Vec<&LayoutRecord> = records.iter().map(Arc::as_ref).collect();
    let json = serde_json::to_string_pretty(&records)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

struct Loaded {
    records: RecordMap,
    /// A file is at the path whose content is neither loaded nor backed up.
    guard_existing: bool,
}

impl Loaded {
    fn from_map(records: RecordMap) -> Self {
        Self {
            records,
            guard_existing: false,
        }
    }

    fn unrecovered() -> Self {
        Self {
            records: RecordMap::new(),
            guard_existing: true,
        }
    }
}

fn load_records(path: &Path) -> Loaded {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Loaded::from_map(RecordMap::new()),
        Err(err) => {
            tracing::warn!(path = %path.display(), "could not read record file, it will not be overwritten: {err}");
            return Loaded::unrecovered();
        }
    };

    match serde_json::from_slice::<Vec<LayoutRecord>>(&content) {
        Ok(records) => Loaded::from_map(
            records
                .into_iter()
                .map(|record| (record.id(), Arc::new(record)))
                .collect(),
        ),
        Err(err) => {
            tracing::error!(path = %path.display(), "record file is corrupt: {err}");
            match backup_corrupt_file(path) {
                Ok(backup) => {
                    tracing::error!(backup = %backup.display(), "corrupt record file moved aside");
                    Loaded::from_map(RecordMap::new())
                }
                Err(err) => {
                    tracing::error!(
                        path = %path.display(),
                        "could not back up corrupt record file, it will not be overwritten: {err}"
                    );
                    Loaded::unrecovered()
                }
            }
        }
    }
}

/// Copies `path` to `<stem>-<YYYY-MM-DD_HH-mm>.json.bak` beside it, then
/// deletes the original. Falls back to renaming when the copy fails.
fn backup_corrupt_file(path: &Path) -> io::Result<PathBuf> {
    let backup = backup_path(path, Local::now());
    match fs::copy(path, &backup) {
        Ok(_) => {
            // The copy is safe, so a leftover original may be overwritten later.
            if let Err(err) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), "could not remove corrupt record file: {err}");
            }
            Ok(backup)
        }
        Err(err) => {
            tracing::warn!(backup = %backup.display(), "copy failed, renaming instead: {err}");
            fs::rename(path, &backup)?;
            Ok(backup)
        }
    }
}

fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshots".into());
    let stamp = now.format("%Y-%m-%d_%H-%M");

    let mut candidate = dir.join(format!("{stem}-{stamp}.json.bak"));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}-{stamp}-{counter}.json.bak"));
        counter += 1;
    }
    candidate
}
