//! # bucketkv
//!
//! An embedded, persistent key-value store with:
//! - Hash-bucket directory sharding with linear-scan collision resolution
//! - Opaque serialized key/value blobs paired by filename suffix
//! - Always-fresh reads (no cached dataset state, every read re-scans disk)
//! - Mutation/iteration conflict detection over outstanding key cursors
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  KeyValueStorage trait                       │
//! │        (read / write / delete / readKeys / size)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      FileStore                               │
//! │        (lifecycle flag + cursor tracker, one mutex)          │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌─────────────┐
//!     │   Bucket    │               │   Cursor    │
//!     │ (addressing │               │  (snapshot  │
//!     │  + scanner) │               │  + tracker) │
//!     └──────┬──────┘               └─────────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │    Codec    │
//!     │  (bincode)  │
//!     └─────────────┘
//! ```
//!
//! On disk, every entry is a `key_<id>` / `value_<id>` file pair inside a
//! directory named after the key's bucket id.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod bucket;
pub mod cursor;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use cursor::KeyCursor;
pub use engine::{FileStore, KeyValueStorage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bucketkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
