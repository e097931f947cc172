//! Inode-level read/write entry points: wraps the indirection engine with
//! size bookkeeping and the post-write integrity check.

use crate::disk::Disk;
use crate::error::FsError;
use crate::indirect::inode_rw;
use crate::inode::{read_inode, write_inode};
use crate::layout::Superblock;

/// Reads up to `buf.len()` bytes of inode `n`'s content starting at `off`.
/// Returns the number of bytes actually read, which is less than
/// `buf.len()` only at end-of-file.
pub fn inode_read(disk: &mut impl Disk, su: &Superblock, n: u32, buf: &mut [u8], off: u32) -> Result<u32, FsError> {
    let mut inode = read_inode(disk, su, n)?;
    inode_rw(disk, su, &mut inode, buf, off, false)
}

/// Writes `buf` into inode `n`'s content at `off`, extending `size` to
/// `max(size, off + consumed)` — computed from the original offset and the
/// bytes actually consumed, not from the traversal's own running offset,
/// since that offset is also advanced while skipping non-overlapping
/// coverage and so does not track "highest byte written" on its own.
///
/// A partial write (bitmap exhaustion) is not an error: the inode's size is
/// updated to reflect whatever was actually written, and the byte count
/// consumed is returned.
pub fn inode_write(disk: &mut impl Disk, su: &Superblock, n: u32, buf: &[u8], off: u32) -> Result<u32, FsError> {
    let mut inode = read_inode(disk, su, n)?;
    let mut scratch = buf.to_vec();
    let consumed = inode_rw(disk, su, &mut inode, &mut scratch, off, true)?;
    let ebyte = off + consumed;
    if ebyte > inode.size {
        inode.size = ebyte;
    }
    write_inode(disk, su, n, &inode)?;
    crate::checker::check(disk, su)?;
    Ok(consumed)
}
