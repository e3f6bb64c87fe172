//! Configuration for bucketkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default number of bucket directories the key space is sharded over
pub const DEFAULT_BUCKET_COUNT: u64 = 1024;

/// Main configuration for a bucketkv store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all bucket directories.
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── 0/               (bucket directory, decimal bucket id)
    ///     │     ├── key_17     (encoded key)
    ///     │     └── value_17   (encoded value, paired by shared suffix)
    ///     └── 731/
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Bucket Addressing Configuration
    // -------------------------------------------------------------------------
    /// Number of buckets the key hash is reduced into.
    ///
    /// Must stay the same for the lifetime of a store root: the bucket id of
    /// a key is derived from this value, so reopening an existing root with a
    /// different count leaves previously written entries unreachable.
    pub bucket_count: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./bucketkv_data"),
            bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory (holds all bucket directories)
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the bucket count (directory fan-out)
    pub fn bucket_count(mut self, count: u64) -> Self {
        self.config.bucket_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
