//! Engine Module
//!
//! The public key-value contract and its file-backed implementation.
//!
//! ## Responsibilities
//! - Route reads/writes/deletes through bucket addressing and the scanner
//! - Allocate collision-free file pairs on insert
//! - Detect mutation/iteration conflicts via the cursor tracker
//! - Enforce the open/closed lifecycle

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bucket::{self, BucketEntry};
use crate::codec;
use crate::config::Config;
use crate::cursor::{CursorTracker, KeyCursor};
use crate::error::{Result, StoreError};

// =============================================================================
// Storage Contract
// =============================================================================

/// The key-value storage contract.
///
/// `FileStore` is the bucket-directory implementation; a backend delegating
/// to a relational mapper satisfies the same surface. Every operation fails
/// with [`StoreError::Closed`] once the store has been closed, and insert or
/// delete fails with [`StoreError::ConcurrentModification`] while a cursor
/// from [`read_keys`](KeyValueStorage::read_keys) is still unconsumed.
pub trait KeyValueStorage<K, V> {
    /// Read the value stored under `key`, if any
    fn read(&self, key: &K) -> Result<Option<V>>;

    /// Whether `key` is currently stored
    fn exists(&self, key: &K) -> Result<bool>;

    /// Store `value` under `key`, replacing any previous value
    fn write(&self, key: &K, value: &V) -> Result<()>;

    /// Remove `key` and its value; removing an absent key is not an error
    fn delete(&self, key: &K) -> Result<()>;

    /// Snapshot the current key set into a one-shot cursor
    fn read_keys(&self) -> Result<KeyCursor<K>>;

    /// Number of distinct keys currently stored
    fn size(&self) -> Result<usize>;

    /// Push pending writes to disk; callable at any point while open
    fn flush(&self) -> Result<()>;

    /// Close the store; idempotent, invalidates outstanding cursors
    fn close(&self) -> Result<()>;
}

// =============================================================================
// File-Backed Engine
// =============================================================================

/// Mutable engine state, all behind one lock.
struct Inner<K> {
    closed: bool,
    tracker: CursorTracker<K>,
}

/// Key-value store persisting each entry as a key/value file pair inside
/// hash-bucket directories.
///
/// ## Concurrency Model
///
/// One `parking_lot::Mutex` serializes every public operation, covering the
/// lifecycle flag, the cursor tracker, and the file I/O of that operation.
/// Cursors are consumed outside the lock. The store root is exclusively
/// owned by one instance for its lifetime; pointing two instances at the
/// same root is unsupported.
///
/// ## Read Model
///
/// No dataset state is cached across calls: every read-path operation
/// re-scans disk, trading throughput for always-fresh reads. Writes are
/// synchronous, so `flush` has nothing to do.
pub struct FileStore<K, V> {
    /// Root directory holding the bucket directories
    root: PathBuf,

    /// Directory fan-out the key hash is reduced into
    bucket_count: u64,

    /// Lifecycle flag + cursor tracker, serialized with the file I/O
    inner: Mutex<Inner<K>>,

    _value: PhantomData<fn() -> V>,
}

impl<K, V> FileStore<K, V>
where
    K: Serialize + DeserializeOwned + Eq + Clone,
    V: Serialize + DeserializeOwned,
{
    /// Open or create a store with the given config.
    ///
    /// A missing root directory is created. An existing one is validated
    /// with a full scan: every stored entry must decode, otherwise the
    /// store fails to open with [`StoreError::Initialization`].
    pub fn open(config: Config) -> Result<Self> {
        if config.bucket_count == 0 {
            return Err(StoreError::Initialization(
                "bucket_count must be non-zero".to_string(),
            ));
        }

        let store = Self {
            root: config.root_dir,
            bucket_count: config.bucket_count,
            inner: Mutex::new(Inner {
                closed: false,
                tracker: CursorTracker::new(),
            }),
            _value: PhantomData,
        };

        if store.root.exists() {
            let keys = store
                .load_keys()
                .map_err(|e| StoreError::Initialization(e.to_string()))?;
            tracing::debug!(
                root = %store.root.display(),
                entries = keys.len(),
                "opened existing store"
            );
        } else {
            fs::create_dir_all(&store.root)?;
            tracing::debug!(root = %store.root.display(), "created store root");
        }

        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified root directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().root_dir(path).build())
    }

    /// Get the root directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Bucket directory of an encoded key
    fn bucket_dir(&self, encoded_key: &[u8]) -> PathBuf {
        let id = bucket::bucket_id(encoded_key, self.bucket_count);
        self.root.join(id.to_string())
    }

    /// Scan every bucket and collect the full key set.
    ///
    /// Each key appears at most once: a key maps to exactly one bucket and
    /// is unique within it, so no dedup is needed. Root entries that are
    /// not bucket directories (non-directories, non-decimal names) are
    /// ignored.
    fn load_keys(&self) -> Result<Vec<K>> {
        let mut keys = Vec::new();

        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if !path.is_dir() || !is_bucket_dir_name(&path) {
                continue;
            }
            for entry in bucket::scan_bucket::<K, V>(&path)? {
                keys.push(entry.key);
            }
        }

        Ok(keys)
    }

    /// Find the entry stored under `key`, if any.
    ///
    /// Resolution is full key equality; the bucket id narrowed the search,
    /// it never decides identity.
    fn find_entry(&self, bucket_dir: &Path, key: &K) -> Result<Option<BucketEntry<K, V>>> {
        if !bucket_dir.is_dir() {
            return Ok(None);
        }
        let entries = bucket::scan_bucket::<K, V>(bucket_dir)?;
        Ok(entries.into_iter().find(|entry| entry.key == *key))
    }

    fn ensure_open(inner: &Inner<K>) -> Result<()> {
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl<K, V> KeyValueStorage<K, V> for FileStore<K, V>
where
    K: Serialize + DeserializeOwned + Eq + Clone,
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &K) -> Result<Option<V>> {
        let inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        let encoded_key = codec::encode(key)?;
        let entry = self.find_entry(&self.bucket_dir(&encoded_key), key)?;
        Ok(entry.map(|e| e.value))
    }

    fn exists(&self, key: &K) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }

    fn write(&self, key: &K, value: &V) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        let encoded_key = codec::encode(key)?;
        let encoded_value = codec::encode(value)?;
        let bucket_dir = self.bucket_dir(&encoded_key);

        // Overwrite in place: the key set does not change, so no guard and
        // no cursor invalidation.
        if let Some(entry) = self.find_entry(&bucket_dir, key)? {
            bucket::overwrite_value(&entry.value_path, &encoded_value)?;
            tracing::trace!(bucket = %bucket_dir.display(), id = entry.id, "overwrote value");
            return Ok(());
        }

        // Insertion is structural: gate on outstanding cursors first, with
        // no data changed on rejection.
        inner.tracker.check_structural_mutation()?;

        fs::create_dir_all(&bucket_dir)?;
        let id = bucket::next_entry_id(&bucket_dir)?;
        bucket::write_entry(&bucket_dir, id, &encoded_key, &encoded_value)?;
        tracing::trace!(bucket = %bucket_dir.display(), id, "inserted entry");

        Ok(())
    }

    fn delete(&self, key: &K) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        // Guarded unconditionally: a delete that turns out to be a no-op
        // still discards tracked cursors, matching insertion.
        inner.tracker.check_structural_mutation()?;

        let encoded_key = codec::encode(key)?;
        let bucket_dir = self.bucket_dir(&encoded_key);
        if !bucket_dir.is_dir() {
            return Ok(());
        }

        // Zero or one matches by the uniqueness invariant; removing all
        // matches also repairs a bucket that somehow holds duplicates.
        for entry in bucket::scan_bucket::<K, V>(&bucket_dir)? {
            if entry.key == *key {
                entry.remove()?;
                tracing::trace!(bucket = %bucket_dir.display(), id = entry.id, "removed entry");
            }
        }

        Ok(())
    }

    fn read_keys(&self) -> Result<KeyCursor<K>> {
        let mut inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        let keys = self.load_keys()?;
        Ok(inner.tracker.register(keys))
    }

    fn size(&self) -> Result<usize> {
        let inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        Ok(self.load_keys()?.len())
    }

    fn flush(&self) -> Result<()> {
        let inner = self.inner.lock();
        Self::ensure_open(&inner)?;

        // Every write already hit disk synchronously.
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Ok(());
        }

        inner.closed = true;
        inner.tracker.invalidate_all();
        tracing::debug!(root = %self.root.display(), "closed store");

        Ok(())
    }
}

/// Whether a root entry is named like a bucket directory (decimal id)
fn is_bucket_dir_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().parse::<u64>().is_ok())
        .unwrap_or(false)
}
