//! Bucket Layout
//!
//! Bucket addressing, the bucket directory scanner, and entry placement.
//!
//! ## On-Disk Layout
//! ```text
//! {root_dir}/
//!   ├── 0/                  bucket directory, decimal bucket id
//!   │     ├── key_17        encoded key blob
//!   │     └── value_17      encoded value blob, paired by shared suffix
//!   └── 731/
//!         ├── key_0
//!         └── value_0
//! ```
//!
//! A key file and its value file are associated purely by the shared decimal
//! suffix, never by content. Files that do not match the `key_<decimal>`
//! convention are ignored by scans; in particular an orphaned `value_*` file
//! left behind by an interrupted write is invisible until its suffix is
//! reused.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::error::{Result, StoreError};

/// Filename prefix of key blobs
const KEY_PREFIX: &str = "key_";

/// Filename prefix of value blobs
const VALUE_PREFIX: &str = "value_";

// =============================================================================
// Bucket Addressing
// =============================================================================

/// Compute the bucket id for an encoded key.
///
/// The id is the CRC32 of the encoded key bytes reduced modulo
/// `bucket_count`. CRC32 is stable across releases and platforms, which
/// matters because bucket ids persist in directory names; `DefaultHasher`
/// carries no such guarantee.
///
/// Distinct keys landing in the same bucket is expected; the scanner
/// resolves lookups by full key equality, never by the id alone.
pub fn bucket_id(encoded_key: &[u8], bucket_count: u64) -> u64 {
    u64::from(crc32fast::hash(encoded_key)) % bucket_count
}

// =============================================================================
// Entry
// =============================================================================

/// One stored key-value association inside a bucket directory.
///
/// Carries the decoded key and value plus the paths of both underlying
/// files, so callers can delete or overwrite the entry in place.
#[derive(Debug)]
pub struct BucketEntry<K, V> {
    /// Shared numeric suffix pairing the two files
    pub id: u64,
    /// Path of the encoded key file
    pub key_path: PathBuf,
    /// Path of the encoded value file
    pub value_path: PathBuf,
    /// Decoded key
    pub key: K,
    /// Decoded value
    pub value: V,
}

impl<K, V> BucketEntry<K, V> {
    /// Remove both files of this entry.
    ///
    /// The key file goes first so a failure between the two removals leaves
    /// an orphaned value file (ignored by scans) rather than a dangling key.
    pub fn remove(&self) -> Result<()> {
        fs::remove_file(&self.key_path)?;
        fs::remove_file(&self.value_path)?;
        Ok(())
    }
}

// =============================================================================
// Bucket Directory Scanner
// =============================================================================

/// Enumerate and decode every entry in a bucket directory.
///
/// Enumeration order is directory order and carries no guarantee. The
/// directory must exist; callers special-case absent buckets as empty.
///
/// A decode failure is surfaced, not skipped: silently dropping an
/// unreadable entry would hide data loss. A key file whose value sibling is
/// missing is reported as [`StoreError::CorruptData`] for the same reason.
pub fn scan_bucket<K, V>(bucket_dir: &Path) -> Result<Vec<BucketEntry<K, V>>>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(bucket_dir)? {
        let dir_entry = dir_entry?;
        let key_path = dir_entry.path();

        // Only well-formed key files name an entry; everything else
        // (orphaned value files, stray files) is ignored.
        let id = match parse_entry_id(&key_path) {
            Some(id) => id,
            None => continue,
        };

        let value_path = value_path(bucket_dir, id);
        if !value_path.is_file() {
            return Err(StoreError::CorruptData(format!(
                "entry {} in {} has no value file",
                id,
                bucket_dir.display()
            )));
        }

        let key = codec::decode(&fs::read(&key_path)?)?;
        let value = codec::decode(&fs::read(&value_path)?)?;

        entries.push(BucketEntry {
            id,
            key_path,
            value_path,
            key,
            value,
        });
    }

    Ok(entries)
}

// =============================================================================
// Entry Placement
// =============================================================================

/// Allocate a suffix not used by any file currently in the bucket.
///
/// One past the highest suffix present (key or value side, so an orphaned
/// value file can never be silently adopted by a new key file).
pub fn next_entry_id(bucket_dir: &Path) -> Result<u64> {
    let mut next = 0u64;

    for dir_entry in fs::read_dir(bucket_dir)? {
        let path = dir_entry?.path();
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => continue,
        };

        let suffix = name
            .strip_prefix(KEY_PREFIX)
            .or_else(|| name.strip_prefix(VALUE_PREFIX));

        if let Some(id) = suffix.and_then(|s| s.parse::<u64>().ok()) {
            next = next.max(id + 1);
        }
    }

    Ok(next)
}

/// Persist a new entry under a fresh suffix as two sibling files.
///
/// The value file is written first and the key file last: the scanner keys
/// off `key_*` files, so an interruption between the two writes leaves an
/// ignorable orphan value file instead of an entry with a missing value.
pub fn write_entry(
    bucket_dir: &Path,
    id: u64,
    encoded_key: &[u8],
    encoded_value: &[u8],
) -> Result<()> {
    fs::write(value_path(bucket_dir, id), encoded_value)?;
    fs::write(key_path(bucket_dir, id), encoded_key)?;
    Ok(())
}

/// Overwrite the value file of an existing entry in place.
///
/// The key did not change, so the key file is left untouched and the
/// association keeps its suffix.
pub fn overwrite_value(value_path: &Path, encoded_value: &[u8]) -> Result<()> {
    fs::write(value_path, encoded_value)?;
    Ok(())
}

// =============================================================================
// Filename Helpers
// =============================================================================

/// Path of the key file with the given suffix
fn key_path(bucket_dir: &Path, id: u64) -> PathBuf {
    bucket_dir.join(format!("{}{}", KEY_PREFIX, id))
}

/// Path of the value file with the given suffix
fn value_path(bucket_dir: &Path, id: u64) -> PathBuf {
    bucket_dir.join(format!("{}{}", VALUE_PREFIX, id))
}

/// Parse an entry id from a key-file path.
/// "key_42" → Some(42); "value_42", "notes.txt" → None
fn parse_entry_id(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_string_lossy();
    let id_str = name.strip_prefix(KEY_PREFIX)?;
    id_str.parse().ok()
}
