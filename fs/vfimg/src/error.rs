//! Error taxonomy for the storage engine.
//!
//! Usage errors (bad path, missing name, duplicate name, ...) are reported
//! through [`FsError`] and leave the disk state untouched. Invariant
//! violations (double free, short disk I/O, a bitmap/reachability mismatch)
//! are programming errors, not runtime conditions, and are raised as panics
//! from deep inside the engine instead — see the integrity checker and
//! [`crate::bitmap`].

use thiserror::Error;

/// A usage-level failure of a filesystem operation.
///
/// None of these indicate disk corruption; the operation simply could not
/// be carried out as requested and has no effect.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum FsError {
    /// Inode number is outside `[0, ninodes)`.
    #[error("invalid inode number")]
    InvalidInode,
    /// Block number is outside the data region.
    #[error("invalid block number")]
    InvalidBlock,
    /// Path exceeds `MAX_PATH` bytes or is empty.
    #[error("path too long or empty")]
    PathTooLong,
    /// Path component exceeds `MAX_NAME` bytes.
    #[error("name too long")]
    NameTooLong,
    /// A path component did not resolve to any inode.
    #[error("no such file or directory")]
    NotFound,
    /// Attempted to descend into, or treat as a directory, a non-directory inode.
    #[error("not a directory")]
    NotDirectory,
    /// A name already exists under the target directory.
    #[error("name already exists")]
    AlreadyExists,
    /// `alloc_inode` was asked for a type outside the legal set.
    #[error("invalid inode type")]
    InvalidType,
    /// No free inode was available.
    #[error("no free inode")]
    NoFreeInode,
    /// The open-file table has no free slot, or the handle given is stale.
    #[error("invalid or exhausted file handle")]
    BadFileHandle,
    /// Write attempted against a file opened read-only, or vice versa.
    #[error("invalid access mode for operation")]
    InvalidAccess,
    /// The underlying backing store returned a short read/write or I/O error.
    #[error("backing store I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        FsError::Io(e.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, FsError>;
