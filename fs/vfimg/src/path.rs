//! Path resolver: maps a slash-separated path to an inode number by walking
//! directory-entry arrays stored in directory inodes.

use crate::disk::Disk;
use crate::error::FsError;
use crate::indirect::inode_rw;
use crate::inode::read_inode;
use crate::layout::{DirEntry, InodeType, Superblock, DIRENT_SIZE, MAX_NAME, MAX_PATH, ROOT_INUM};

/// Looks up `name` under directory `dir_inum`. `Ok(None)` covers both "name
/// not present" and "`dir_inum` is not a directory" — callers that need to
/// distinguish the latter check the inode type themselves first.
pub fn dir_lookup(
    disk: &mut impl Disk,
    su: &Superblock,
    dir_inum: u32,
    name: &str,
) -> Result<Option<(u32, u32)>, FsError> {
    let mut inode = read_inode(disk, su, dir_inum)?;
    if inode.typ != InodeType::Directory as u16 {
        return Ok(None);
    }
    let nentries = inode.size as usize / DIRENT_SIZE;
    for i in 0..nentries {
        let off = (i * DIRENT_SIZE) as u32;
        let mut raw = [0u8; DIRENT_SIZE];
        inode_rw(disk, su, &mut inode, &mut raw, off, false)?;
        let de = DirEntry::from_bytes(&raw);
        if !de.is_free() && de.name_str() == name {
            return Ok(Some((de.inum, off)));
        }
    }
    Ok(None)
}

/// Resolves a `/`-separated path to an inode number, starting from the root.
///
/// Rejects paths that are empty, exceed [`MAX_PATH`] bytes, or do not begin
/// with `/`. A missing component, or descending into a non-directory,
/// yields [`FsError::NotFound`].
pub fn lookup(disk: &mut impl Disk, su: &Superblock, path: &str) -> Result<u32, FsError> {
    validate(path)?;
    if path == "/" {
        return Ok(ROOT_INUM);
    }
    let mut cur = ROOT_INUM;
    for comp in path[1..].split('/').filter(|s| !s.is_empty()) {
        if comp.len() > MAX_NAME {
            return Err(FsError::NameTooLong);
        }
        cur = dir_lookup(disk, su, cur, comp)?
            .map(|(inum, _)| inum)
            .ok_or(FsError::NotFound)?;
    }
    Ok(cur)
}

fn validate(path: &str) -> Result<(), FsError> {
    if path.is_empty() || path.len() > MAX_PATH || !path.starts_with('/') {
        return Err(FsError::PathTooLong);
    }
    Ok(())
}

/// Splits `path` into its parent directory's path and its leaf name, e.g.
/// `/a/b/c` -> (`/a/b`, `c`). The root path and an all-slash path have no
/// leaf component and are rejected.
pub fn split_parent(path: &str) -> Result<(&str, &str), FsError> {
    validate(path)?;
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(FsError::PathTooLong);
    }
    let slash = trimmed.rfind('/').expect("path was validated to start with '/'");
    let leaf = &trimmed[slash + 1..];
    if leaf.is_empty() || leaf.len() > MAX_NAME {
        return Err(FsError::NameTooLong);
    }
    let parent = if slash == 0 { "/" } else { &trimmed[..slash] };
    Ok((parent, leaf))
}

/// Lists the names present in directory `dir_inum`, in on-disk entry order.
pub fn list_dir(disk: &mut impl Disk, su: &Superblock, dir_inum: u32) -> Result<Vec<String>, FsError> {
    let mut inode = read_inode(disk, su, dir_inum)?;
    if inode.typ != InodeType::Directory as u16 {
        return Err(FsError::NotDirectory);
    }
    let nentries = inode.size as usize / DIRENT_SIZE;
    let mut names = Vec::with_capacity(nentries);
    for i in 0..nentries {
        let off = (i * DIRENT_SIZE) as u32;
        let mut raw = [0u8; DIRENT_SIZE];
        inode_rw(disk, su, &mut inode, &mut raw, off, false)?;
        let de = DirEntry::from_bytes(&raw);
        if !de.is_free() {
            names.push(de.name_str().to_string());
        }
    }
    Ok(names)
}

/// Resolves the parent directory of `path` and returns it alongside the
/// leaf name, the way `mknod`/`unlink`/`link` need it.
pub fn lookup_parent(disk: &mut impl Disk, su: &Superblock, path: &str) -> Result<(u32, String), FsError> {
    let (parent_path, leaf) = split_parent(path)?;
    let parent_inum = lookup(disk, su, parent_path)?;
    Ok((parent_inum, leaf.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inode::{alloc_inode, write_inode};
    use crate::layout::{BLOCKSIZE, NBLOCKS_TOT};
    use std::io::Cursor;

    fn disk_with_tree() -> (Cursor<Vec<u8>>, Superblock) {
        let mut disk = Cursor::new(vec![0u8; NBLOCKS_TOT as usize * BLOCKSIZE]);
        let su = crate::superblock::init(&mut disk).unwrap();

        let a = alloc_inode(&mut disk, &su, InodeType::Directory).unwrap();
        let b = alloc_inode(&mut disk, &su, InodeType::Regular).unwrap();

        let mut root = read_inode(&mut disk, &su, ROOT_INUM).unwrap();
        let de_a = DirEntry::new(a, "a");
        let off = root.size;
        inode_rw(&mut disk, &su, &mut root, &mut de_a.to_bytes(), off, true).unwrap();
        root.size = off + DIRENT_SIZE as u32;
        write_inode(&mut disk, &su, ROOT_INUM, &root).unwrap();

        let mut a_inode = read_inode(&mut disk, &su, a).unwrap();
        let de_b = DirEntry::new(b, "b");
        inode_rw(&mut disk, &su, &mut a_inode, &mut de_b.to_bytes(), 0, true).unwrap();
        a_inode.size = DIRENT_SIZE as u32;
        write_inode(&mut disk, &su, a, &a_inode).unwrap();

        (disk, su)
    }

    #[test]
    fn root_resolves_directly() {
        let (mut disk, su) = disk_with_tree();
        assert_eq!(lookup(&mut disk, &su, "/").unwrap(), ROOT_INUM);
    }

    #[test]
    fn nested_path_resolves() {
        let (mut disk, su) = disk_with_tree();
        let ab = lookup(&mut disk, &su, "/a/b").unwrap();
        assert_ne!(ab, 0);
    }

    #[test]
    fn missing_component_is_not_found() {
        let (mut disk, su) = disk_with_tree();
        assert_eq!(lookup(&mut disk, &su, "/a/c"), Err(FsError::NotFound));
    }

    #[test]
    fn descending_into_a_file_is_not_found() {
        let (mut disk, su) = disk_with_tree();
        assert_eq!(lookup(&mut disk, &su, "/a/b/x"), Err(FsError::NotFound));
    }

    #[test]
    fn rejects_relative_and_oversized_paths() {
        let (mut disk, su) = disk_with_tree();
        assert_eq!(lookup(&mut disk, &su, "a/b"), Err(FsError::PathTooLong));
        assert_eq!(lookup(&mut disk, &su, ""), Err(FsError::PathTooLong));
        let long = format!("/{}", "x".repeat(600));
        assert_eq!(lookup(&mut disk, &su, &long), Err(FsError::PathTooLong));
    }

    #[test]
    fn split_parent_separates_leaf_from_directory() {
        assert_eq!(split_parent("/a/b/c").unwrap(), ("/a/b", "c"));
        assert_eq!(split_parent("/f").unwrap(), ("/", "f"));
        assert!(split_parent("/").is_err());
    }

    #[test]
    fn list_dir_enumerates_entries() {
        let (mut disk, su) = disk_with_tree();
        let names = list_dir(&mut disk, &su, ROOT_INUM).unwrap();
        assert_eq!(names, vec!["a".to_string()]);
    }
}
