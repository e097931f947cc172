//! Inode table: load/store a single inode, allocate a free one, and free an
//! inode together with every block it reaches.

use crate::disk::Disk;
use crate::error::FsError;
use crate::indirect::free_indirect;
use crate::layout::{ilevel, DiskInode, InodeType, Superblock, BLOCKSIZE, NINODES_PER_BLOCK, NPTRS};

fn block_of(su: &Superblock, n: u32) -> u32 {
    su.sinode + n / NINODES_PER_BLOCK as u32
}

fn slot_of(n: u32) -> usize {
    (n % NINODES_PER_BLOCK as u32) as usize
}

/// Reads inode `n` from its containing block.
pub fn read_inode(disk: &mut impl Disk, su: &Superblock, n: u32) -> Result<DiskInode, FsError> {
    if n >= su.ninodes {
        return Err(FsError::InvalidInode);
    }
    let mut block = [0u8; BLOCKSIZE];
    disk.read_block(block_of(su, n), &mut block)?;
    Ok(DiskInode::from_block(&block, slot_of(n)))
}

/// Read-modify-writes inode `n`'s containing block with the new record.
pub fn write_inode(disk: &mut impl Disk, su: &Superblock, n: u32, inode: &DiskInode) -> Result<(), FsError> {
    if n >= su.ninodes {
        return Err(FsError::InvalidInode);
    }
    let bn = block_of(su, n);
    let mut block = [0u8; BLOCKSIZE];
    disk.read_block(bn, &mut block)?;
    inode.write_to_block(&mut block, slot_of(n));
    disk.write_block(bn, &block)
}

/// Scans all inode blocks in order and allocates the first unused slot.
pub fn alloc_inode(disk: &mut impl Disk, su: &Superblock, typ: InodeType) -> Result<u32, FsError> {
    if typ == InodeType::Unused {
        return Err(FsError::InvalidType);
    }
    for b in 0..su.nblock_inode {
        let bn = su.sinode + b;
        let mut block = [0u8; BLOCKSIZE];
        disk.read_block(bn, &mut block)?;
        for slot in 0..NINODES_PER_BLOCK {
            let n = b * NINODES_PER_BLOCK as u32 + slot as u32;
            if n >= su.ninodes {
                break;
            }
            let existing = DiskInode::from_block(&block, slot);
            if existing.typ == InodeType::Unused as u16 {
                let mut fresh = DiskInode::zeroed();
                fresh.typ = typ as u16;
                fresh.linkcnt = 1;
                fresh.write_to_block(&mut block, slot);
                disk.write_block(bn, &block)?;
                log::debug!("inode: allocated inode {n} as type {typ:?}");
                return Ok(n);
            }
        }
    }
    Err(FsError::NoFreeInode)
}

/// Frees inode `n`: releases every block it reaches (data, singly-indirect,
/// doubly-indirect) before clearing its type, so the bitmap invariant never
/// observes a transient state where the inode is gone but its blocks are
/// still marked allocated by nobody — or vice versa.
pub fn free_inode(disk: &mut impl Disk, su: &Superblock, n: u32) -> Result<(), FsError> {
    let mut inode = read_inode(disk, su, n)?;
    for slot in 0..NPTRS {
        let ptr = inode.ptrs[slot];
        if ptr != 0 {
            free_indirect(disk, su, ptr, ilevel(slot))?;
        }
    }
    inode.typ = 0;
    inode.ptrs = [0; NPTRS];
    inode.size = 0;
    write_inode(disk, su, n, &inode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn fresh() -> (Cursor<Vec<u8>>, Superblock) {
        let su = Superblock::derive(16, 64, 2, 2);
        let mut disk = Cursor::new(vec![0u8; su.nblock_tot as usize * BLOCKSIZE]);
        for b in 0..su.nblock_inode {
            disk.write_block(su.sinode + b, &[0u8; BLOCKSIZE]).unwrap();
        }
        disk.write_block(su.sbitmap, &[0u8; BLOCKSIZE]).unwrap();
        (disk, su)
    }

    #[test]
    fn alloc_then_read_reflects_type_and_linkcnt() {
        let (mut disk, su) = fresh();
        let n = alloc_inode(&mut disk, &su, InodeType::Regular).unwrap();
        let inode = read_inode(&mut disk, &su, n).unwrap();
        assert_eq!(inode.typ, InodeType::Regular as u16);
        assert_eq!(inode.linkcnt, 1);
        assert_eq!(inode.size, 0);
    }

    #[test]
    fn allocation_never_repeats_a_live_inode() {
        let (mut disk, su) = fresh();
        let a = alloc_inode(&mut disk, &su, InodeType::Regular).unwrap();
        let b = alloc_inode(&mut disk, &su, InodeType::Regular).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_type_is_rejected() {
        let (mut disk, su) = fresh();
        assert_eq!(
            alloc_inode(&mut disk, &su, InodeType::Unused),
            Err(FsError::InvalidType)
        );
    }

    #[test]
    fn free_inode_releases_its_blocks() {
        let (mut disk, su) = fresh();
        let n = alloc_inode(&mut disk, &su, InodeType::Regular).unwrap();
        let mut inode = read_inode(&mut disk, &su, n).unwrap();
        let mut buf = [1u8; 10];
        let consumed = crate::indirect::inode_rw(&mut disk, &su, &mut inode, &mut buf, 0, true).unwrap();
        assert_eq!(consumed, 10);
        inode.size = 10;
        write_inode(&mut disk, &su, n, &inode).unwrap();

        assert!(crate::bitmap::population(&mut disk, &su).unwrap() > 0);
        free_inode(&mut disk, &su, n).unwrap();
        assert_eq!(crate::bitmap::population(&mut disk, &su).unwrap(), 0);
        let freed = read_inode(&mut disk, &su, n).unwrap();
        assert_eq!(freed.typ, 0);
    }
}
