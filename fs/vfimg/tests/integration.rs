//! Exercises the crate against a real host file instead of an in-memory
//! cursor, the way the CLI binary actually uses it.

use std::fs::OpenOptions;
use vfimg::layout::{BLOCKSIZE, NBLOCKS_TOT};
use vfimg::{AccessMode, FileSystem, InodeType};

fn backing_file() -> (tempfile::NamedTempFile, std::fs::File) {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.as_file().set_len((NBLOCKS_TOT as usize * BLOCKSIZE) as u64).unwrap();
    let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
    (tmp, file)
}

#[test]
fn round_trips_through_a_real_file_and_survives_remount() {
    let msg = b"written to a real host file";
    let (tmp, file) = backing_file();
    {
        let mut fs = FileSystem::mount(file).unwrap();
        fs.mknod("/notes", InodeType::Regular).unwrap();
        let fd = fs.open("/notes", AccessMode::ReadWrite).unwrap();
        fs.write(fd, msg).unwrap();
        fs.close(fd).unwrap();
        fs.check().unwrap();
    }

    let reopened = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
    let mut fs = FileSystem::mount(reopened).unwrap();
    let fd = fs.open("/notes", AccessMode::ReadOnly).unwrap();
    let mut buf = vec![0u8; msg.len()];
    fs.read(fd, &mut buf).unwrap();
    assert_eq!(buf, msg);
}
