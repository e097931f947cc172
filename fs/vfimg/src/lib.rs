//! A minimal UNIX-style filesystem hosted entirely inside a single
//! fixed-size backing file: superblock, inode table, free-block bitmap, and
//! a multi-level indirect-block addressing scheme, wrapped in a path
//! resolver and an open-file table.
//!
//! The crate is organized bottom-up, each module covering one layer:
//!
//! - [`disk`] — positioned block I/O against anything `Read + Write + Seek`.
//! - [`layout`] — on-disk constants and record (de)serialization.
//! - [`bitmap`] — free data-block allocation.
//! - [`inode`] — the inode table.
//! - [`indirect`] — the recursive direct/indirect/doubly-indirect engine.
//! - [`ops`] — inode-level read/write, with size bookkeeping.
//! - [`checker`] — post-write bitmap/reachability consistency check.
//! - [`superblock`] — format/recognise the backing store.
//! - [`path`] — path-to-inode resolution.
//! - [`file`] — the open-file table and path-aware operations.
//!
//! Callers outside the crate are expected to use [`FileSystem`] rather than
//! reaching for the module functions directly.

pub mod bitmap;
pub mod checker;
pub mod disk;
pub mod error;
pub mod file;
pub mod indirect;
pub mod inode;
pub mod layout;
pub mod ops;
pub mod path;
pub mod superblock;

pub use error::{FsError, Result};
pub use file::{AccessMode, FileStat, MAX_OPEN_FILES};
pub use layout::{InodeType, Superblock};

use disk::Disk;
use file::OpenFileTable;

/// A filesystem mounted on a single backing store `D`.
///
/// Holds the cached superblock layout and the process-wide open-file table
/// alongside the store itself, so a caller only ever needs one handle.
pub struct FileSystem<D: Disk> {
    disk: D,
    su: Superblock,
    files: OpenFileTable,
}

impl<D: Disk> FileSystem<D> {
    /// Mounts `disk`, formatting it on first use and recognising it on
    /// every subsequent mount.
    pub fn mount(mut disk: D) -> Result<Self> {
        let su = superblock::init(&mut disk)?;
        Ok(FileSystem {
            disk,
            su,
            files: OpenFileTable::new(),
        })
    }

    /// Creates a new inode of `typ` at `path`.
    pub fn mknod(&mut self, path: &str, typ: InodeType) -> Result<u32> {
        file::mknod(&mut self.disk, &self.su, path, typ)
    }

    /// Removes the directory entry at `path`, freeing the target inode once
    /// its link count reaches zero.
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        file::unlink(&mut self.disk, &self.su, path)
    }

    /// Adds a new name `new` for the inode that `old` already resolves to.
    pub fn link(&mut self, new: &str, old: &str) -> Result<()> {
        file::link(&mut self.disk, &self.su, new, old)
    }

    /// Opens `path` in `mode`, returning a file descriptor.
    pub fn open(&mut self, path: &str, mode: AccessMode) -> Result<usize> {
        self.files.open(&mut self.disk, &self.su, path, mode)
    }

    /// Closes a descriptor previously returned by [`FileSystem::open`].
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.files.close(fd)
    }

    /// Reads from `fd` at its current offset, advancing it.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<u32> {
        self.files.read(&mut self.disk, &self.su, fd, buf)
    }

    /// Writes to `fd` at its current offset, advancing it.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<u32> {
        self.files.write(&mut self.disk, &self.su, fd, buf)
    }

    /// Repositions `fd`'s offset.
    pub fn seek(&mut self, fd: usize, off: u32) -> Result<()> {
        self.files.seek(fd, off)
    }

    /// Returns `fd`'s inode metadata.
    pub fn stat(&mut self, fd: usize) -> Result<FileStat> {
        self.files.stat(&mut self.disk, &self.su, fd)
    }

    /// Resolves `path` to an inode number without opening it.
    pub fn lookup(&mut self, path: &str) -> Result<u32> {
        path::lookup(&mut self.disk, &self.su, path)
    }

    /// Lists the names present in the directory at `path`.
    pub fn ls(&mut self, path: &str) -> Result<Vec<String>> {
        let dir = path::lookup(&mut self.disk, &self.su, path)?;
        path::list_dir(&mut self.disk, &self.su, dir)
    }

    /// Runs the full-disk bitmap/reachability consistency check.
    pub fn check(&mut self) -> Result<()> {
        checker::check(&mut self.disk, &self.su)
    }

    /// Borrows the cached layout, e.g. for a caller that wants to report
    /// capacity figures.
    pub fn layout(&self) -> &Superblock {
        &self.su
    }
}
