//! Integrity checker: after every write, counts blocks reachable from all
//! live inodes and cross-checks against the bitmap population.
//!
//! A divergence is a programming error, not a runtime condition — it means
//! some write path allocated or freed a block without keeping the bitmap
//! and the inode tree in agreement — so it aborts the process rather than
//! returning a [`crate::error::FsError`].

use crate::bitmap;
use crate::disk::Disk;
use crate::error::FsError;
use crate::indirect::recursive_count;
use crate::layout::{ilevel, DiskInode, Superblock, BLOCKSIZE, NINODES_PER_BLOCK, NPTRS};

/// Runs the full-disk consistency check, panicking on divergence.
pub fn check(disk: &mut impl Disk, su: &Superblock) -> Result<(), FsError> {
    let mut reachable = 0u32;
    for b in 0..su.nblock_inode {
        let mut block = [0u8; BLOCKSIZE];
        disk.read_block(su.sinode + b, &mut block)?;
        for slot in 0..NINODES_PER_BLOCK {
            let n = b * NINODES_PER_BLOCK as u32 + slot as u32;
            if n >= su.ninodes {
                break;
            }
            let inode = DiskInode::from_block(&block, slot);
            if inode.typ == 0 {
                continue;
            }
            for (i, &ptr) in inode.ptrs.iter().enumerate().take(NPTRS) {
                reachable += recursive_count(disk, su, ptr, ilevel(i))?;
            }
        }
    }
    let allocated = bitmap::population(disk, su)?;
    assert_eq!(
        reachable, allocated,
        "filesystem integrity violated: {reachable} blocks reachable from live inodes but {allocated} marked allocated"
    );
    Ok(())
}
