//! File-level layer: the open-file table and the path-aware operations
//! (`mknod`, `open`, `read`, `write`, `seek`, `stat`, `link`, `unlink`,
//! `close`) built on top of the inode API.

use crate::disk::Disk;
use crate::error::FsError;
use crate::inode::{alloc_inode, free_inode, read_inode, write_inode};
use crate::layout::{DirEntry, InodeType, Superblock};
use crate::ops::{inode_read, inode_write};
use crate::path::{dir_lookup, lookup, lookup_parent};

/// Process-wide open-file table capacity, matching the source's fixed
/// `NFILES`-sized array.
pub const MAX_OPEN_FILES: usize = 100;

/// Access mode an open file was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    fn allows_read(self) -> bool {
        !matches!(self, AccessMode::WriteOnly)
    }
    fn allows_write(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

/// A snapshot of an inode's metadata, returned by [`OpenFileTable::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub typ: u16,
    pub size: u32,
    pub linkcnt: u16,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    inum: u32,
    off: u32,
    mode: AccessMode,
    refcnt: u32,
}

/// The process-wide table mapping small integer handles to open files.
///
/// Lifecycle: a slot is created on `open`, mutated by `read`/`write`/`seek`,
/// and released once its reference count reaches zero on `close`.
#[derive(Debug)]
pub struct OpenFileTable {
    slots: Vec<Option<Entry>>,
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFileTable {
    /// Creates an empty table with [`MAX_OPEN_FILES`] slots.
    pub fn new() -> Self {
        OpenFileTable {
            slots: vec![None; MAX_OPEN_FILES],
        }
    }

    fn slot(&self, fd: usize) -> Result<&Entry, FsError> {
        self.slots.get(fd).and_then(|s| s.as_ref()).ok_or(FsError::BadFileHandle)
    }

    fn slot_mut(&mut self, fd: usize) -> Result<&mut Entry, FsError> {
        self.slots.get_mut(fd).and_then(|s| s.as_mut()).ok_or(FsError::BadFileHandle)
    }

    /// Resolves `path` and installs it in the first free slot.
    pub fn open(&mut self, disk: &mut impl Disk, su: &Superblock, path: &str, mode: AccessMode) -> Result<usize, FsError> {
        let inum = lookup(disk, su, path)?;
        let fd = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(FsError::BadFileHandle)?;
        self.slots[fd] = Some(Entry { inum, off: 0, mode, refcnt: 1 });
        Ok(fd)
    }

    /// Sets the slot's byte offset directly, without bounds-checking
    /// against the inode's size — seeking past the end and then writing is
    /// exactly how a sparse file is created.
    pub fn seek(&mut self, fd: usize, off: u32) -> Result<(), FsError> {
        self.slot_mut(fd)?.off = off;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes at the slot's current offset, then
    /// advances it by the amount actually read.
    pub fn read(&mut self, disk: &mut impl Disk, su: &Superblock, fd: usize, buf: &mut [u8]) -> Result<u32, FsError> {
        let entry = *self.slot(fd)?;
        if !entry.mode.allows_read() {
            return Err(FsError::InvalidAccess);
        }
        let n = inode_read(disk, su, entry.inum, buf, entry.off)?;
        self.slot_mut(fd)?.off += n;
        Ok(n)
    }

    /// Writes `buf` at the slot's current offset, then advances it by the
    /// amount actually consumed.
    pub fn write(&mut self, disk: &mut impl Disk, su: &Superblock, fd: usize, buf: &[u8]) -> Result<u32, FsError> {
        let entry = *self.slot(fd)?;
        if !entry.mode.allows_write() {
            return Err(FsError::InvalidAccess);
        }
        let n = inode_write(disk, su, entry.inum, buf, entry.off)?;
        self.slot_mut(fd)?.off += n;
        Ok(n)
    }

    /// Returns the open file's inode metadata.
    pub fn stat(&self, disk: &mut impl Disk, su: &Superblock, fd: usize) -> Result<FileStat, FsError> {
        let entry = *self.slot(fd)?;
        let inode = read_inode(disk, su, entry.inum)?;
        Ok(FileStat {
            typ: inode.typ,
            size: inode.size,
            linkcnt: inode.linkcnt,
        })
    }

    /// Decrements the slot's reference count, freeing it at zero.
    pub fn close(&mut self, fd: usize) -> Result<(), FsError> {
        let entry = self.slot_mut(fd)?;
        entry.refcnt -= 1;
        if entry.refcnt == 0 {
            self.slots[fd] = None;
        }
        Ok(())
    }
}

/// Appends a directory entry to `dir_inum`, growing its size.
fn append_dirent(disk: &mut impl Disk, su: &Superblock, dir_inum: u32, entry: &DirEntry) -> Result<(), FsError> {
    let dir = read_inode(disk, su, dir_inum)?;
    inode_write(disk, su, dir_inum, &entry.to_bytes(), dir.size)?;
    Ok(())
}

/// Creates a new inode of `typ` and links it under `path`'s parent
/// directory with `path`'s leaf name.
pub fn mknod(disk: &mut impl Disk, su: &Superblock, path: &str, typ: InodeType) -> Result<u32, FsError> {
    let (parent, name) = lookup_parent(disk, su, path)?;
    let parent_inode = read_inode(disk, su, parent)?;
    if parent_inode.typ != InodeType::Directory as u16 {
        return Err(FsError::NotDirectory);
    }
    if dir_lookup(disk, su, parent, &name)?.is_some() {
        return Err(FsError::AlreadyExists);
    }
    let inum = alloc_inode(disk, su, typ)?;
    if let Err(e) = append_dirent(disk, su, parent, &DirEntry::new(inum, &name)) {
        free_inode(disk, su, inum).ok();
        return Err(e);
    }
    Ok(inum)
}

/// Removes `path`'s directory entry and decrements the target inode's link
/// count, freeing it (and its blocks) once that count reaches zero.
pub fn unlink(disk: &mut impl Disk, su: &Superblock, path: &str) -> Result<(), FsError> {
    let (parent, name) = lookup_parent(disk, su, path)?;
    let parent_inode = read_inode(disk, su, parent)?;
    if parent_inode.typ != InodeType::Directory as u16 {
        return Err(FsError::NotDirectory);
    }
    let (target, off) = dir_lookup(disk, su, parent, &name)?.ok_or(FsError::NotFound)?;
    inode_write(disk, su, parent, &DirEntry::empty().to_bytes(), off)?;

    let mut inode = read_inode(disk, su, target)?;
    inode.linkcnt -= 1;
    if inode.linkcnt == 0 {
        free_inode(disk, su, target)?;
    } else {
        write_inode(disk, su, target, &inode)?;
    }
    Ok(())
}

/// Creates a new directory entry `new` pointing at the inode `old` already
/// resolves to, incrementing its link count. Requires `old` to resolve —
/// the source's inverted check on this condition is not reproduced here
/// (see the design notes).
pub fn link(disk: &mut impl Disk, su: &Superblock, new: &str, old: &str) -> Result<(), FsError> {
    let target = lookup(disk, su, old)?;
    let (parent, name) = lookup_parent(disk, su, new)?;
    let parent_inode = read_inode(disk, su, parent)?;
    if parent_inode.typ != InodeType::Directory as u16 {
        return Err(FsError::NotDirectory);
    }
    if dir_lookup(disk, su, parent, &name)?.is_some() {
        return Err(FsError::AlreadyExists);
    }
    append_dirent(disk, su, parent, &DirEntry::new(target, &name))?;
    let mut inode = read_inode(disk, su, target)?;
    inode.linkcnt += 1;
    write_inode(disk, su, target, &inode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BLOCKSIZE, NBLOCKS_TOT};
    use std::io::Cursor;

    fn fresh() -> (Cursor<Vec<u8>>, Superblock) {
        let mut disk = Cursor::new(vec![0u8; NBLOCKS_TOT as usize * BLOCKSIZE]);
        let su = crate::superblock::init(&mut disk).unwrap();
        (disk, su)
    }

    #[test]
    fn mknod_then_open_read_write() {
        let (mut disk, su) = fresh();
        mknod(&mut disk, &su, "/f", InodeType::Regular).unwrap();

        let mut table = OpenFileTable::new();
        let fd = table.open(&mut disk, &su, "/f", AccessMode::ReadWrite).unwrap();
        assert_eq!(table.write(&mut disk, &su, fd, b"abc").unwrap(), 3);
        table.seek(fd, 0).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(table.read(&mut disk, &su, fd, &mut out).unwrap(), 3);
        assert_eq!(&out, b"abc");
        table.close(fd).unwrap();
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (mut disk, su) = fresh();
        mknod(&mut disk, &su, "/f", InodeType::Regular).unwrap();
        assert_eq!(mknod(&mut disk, &su, "/f", InodeType::Regular), Err(FsError::AlreadyExists));
    }

    #[test]
    fn mknod_under_missing_parent_fails() {
        let (mut disk, su) = fresh();
        assert_eq!(mknod(&mut disk, &su, "/missing/f", InodeType::Regular), Err(FsError::NotFound));
    }

    #[test]
    fn link_unlink_round_trip_restores_bitmap() {
        let (mut disk, su) = fresh();
        let before = crate::bitmap::population(&mut disk, &su).unwrap();

        mknod(&mut disk, &su, "/f", InodeType::Regular).unwrap();
        link(&mut disk, &su, "/g", "/f").unwrap();

        let f_inum = lookup(&mut disk, &su, "/f").unwrap();
        let g_inum = lookup(&mut disk, &su, "/g").unwrap();
        assert_eq!(f_inum, g_inum);
        assert_eq!(read_inode(&mut disk, &su, f_inum).unwrap().linkcnt, 2);

        unlink(&mut disk, &su, "/f").unwrap();
        assert_eq!(read_inode(&mut disk, &su, g_inum).unwrap().linkcnt, 1);
        assert_eq!(lookup(&mut disk, &su, "/g").unwrap(), g_inum);

        unlink(&mut disk, &su, "/g").unwrap();
        assert_eq!(lookup(&mut disk, &su, "/g"), Err(FsError::NotFound));
        assert_eq!(crate::bitmap::population(&mut disk, &su).unwrap(), before);
    }

    #[test]
    fn mknod_unlink_round_trip_restores_free_inode_count() {
        let (mut disk, su) = fresh();
        let n1 = alloc_probe(&mut disk, &su);
        mknod(&mut disk, &su, "/f", InodeType::Regular).unwrap();
        unlink(&mut disk, &su, "/f").unwrap();
        let n2 = alloc_probe(&mut disk, &su);
        assert_eq!(n1, n2);
    }

    fn alloc_probe(disk: &mut impl Disk, su: &Superblock) -> u32 {
        let n = alloc_inode(disk, su, InodeType::Regular).unwrap();
        free_inode(disk, su, n).unwrap();
        n
    }

    #[test]
    fn link_requires_old_to_resolve() {
        let (mut disk, su) = fresh();
        assert_eq!(link(&mut disk, &su, "/g", "/missing"), Err(FsError::NotFound));
    }
}
