//! Raw positioned block I/O against a file-like backing store.
//!
//! No caching happens here or anywhere above it: every [`Disk::read_block`]
//! / [`Disk::write_block`] is a full round trip to the store. A short
//! read or write is treated as a fatal I/O error, since the backing store
//! is assumed pre-sized to `NBLOCKS_TOT * BLOCKSIZE` bytes.

use crate::error::FsError;
use crate::layout::BLOCKSIZE;
use std::io::{Read, Seek, SeekFrom, Write};

/// A block-addressable backing store.
///
/// Implemented for anything that is `Read + Write + Seek`, so tests can swap
/// in an in-memory cursor instead of a real file.
pub trait Disk {
    /// Reads block `n` into `buf`.
    fn read_block(&mut self, n: u32, buf: &mut [u8; BLOCKSIZE]) -> Result<(), FsError>;
    /// Writes `buf` into block `n`.
    fn write_block(&mut self, n: u32, buf: &[u8; BLOCKSIZE]) -> Result<(), FsError>;
}

impl<T: Read + Write + Seek> Disk for T {
    fn read_block(&mut self, n: u32, buf: &mut [u8; BLOCKSIZE]) -> Result<(), FsError> {
        self.seek(SeekFrom::Start(n as u64 * BLOCKSIZE as u64))?;
        self.read_exact(buf).map_err(|e| {
            log::error!("short read at block {n}: {e}");
            FsError::Io(e.to_string())
        })
    }

    fn write_block(&mut self, n: u32, buf: &[u8; BLOCKSIZE]) -> Result<(), FsError> {
        self.seek(SeekFrom::Start(n as u64 * BLOCKSIZE as u64))?;
        self.write_all(buf).map_err(|e| {
            log::error!("short write at block {n}: {e}");
            FsError::Io(e.to_string())
        })
    }
}
