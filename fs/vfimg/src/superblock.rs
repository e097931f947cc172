//! Superblock manager: recognise a formatted backing store by magic, or
//! format a fresh one and cache the derived layout.

use crate::disk::Disk;
use crate::error::FsError;
use crate::inode::{alloc_inode, read_inode, write_inode};
use crate::layout::{InodeType, Superblock, BLOCKSIZE, NBLOCKS_LOG, NBLOCKS_RES, NBLOCKS_TOT, NINODES, NULL_INUM, ROOT_INUM};

/// Opens (recognising) or formats the backing store, returning the cached
/// layout. Idempotent: calling this again on an already-formatted store
/// just re-reads the superblock without reformatting.
pub fn init(disk: &mut impl Disk) -> Result<Superblock, FsError> {
    let mut block = [0u8; BLOCKSIZE];
    disk.read_block(NBLOCKS_RES, &mut block)?;
    if let Some(su) = Superblock::from_block(&block) {
        log::info!("recognised an existing vfimg filesystem");
        return Ok(su);
    }
    format(disk, NINODES, NBLOCKS_TOT, NBLOCKS_RES, NBLOCKS_LOG)
}

/// Zeroes the entire store, writes a fresh superblock derived from the
/// given parameters, and reserves inode 0 (NULL, permanently unavailable)
/// and inode 1 (the root directory).
pub fn format(
    disk: &mut impl Disk,
    ninodes: u32,
    nblock_tot: u32,
    nblock_res: u32,
    nblock_log: u32,
) -> Result<Superblock, FsError> {
    let zero = [0u8; BLOCKSIZE];
    for b in 0..nblock_tot {
        disk.write_block(b, &zero)?;
    }
    let su = Superblock::derive(ninodes, nblock_tot, nblock_res, nblock_log);
    disk.write_block(nblock_res, &su.to_block())?;

    // Inode 0 is the NULL sentinel: give it a non-Unused type so the
    // allocator never hands it back out, then allocate the root directory
    // right behind it.
    let null = alloc_inode(disk, &su, InodeType::Device)?;
    assert_eq!(null, NULL_INUM, "inode 0 must be reserved first");
    let root = alloc_inode(disk, &su, InodeType::Directory)?;
    assert_eq!(root, ROOT_INUM, "inode 1 must be the root directory");
    let mut root_inode = read_inode(disk, &su, root)?;
    root_inode.linkcnt = 1;
    write_inode(disk, &su, root, &root_inode)?;

    log::info!(
        "formatted vfimg filesystem: {} inodes, {} data blocks",
        su.ninodes,
        su.nblock_dat
    );
    Ok(su)
}
