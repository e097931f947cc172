//! `vfimg-cli`: a thin interactive shell over a [`vfimg::FileSystem`] backed
//! by a single host file, reading whitespace-tokenised commands from
//! standard input.

use clap::Parser;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use vfimg::{AccessMode, FileSystem, InodeType};

#[derive(Parser)]
#[command(author, version, about = "Shell over a vfimg backing file")]
struct Cli {
    /// Path to the backing file, already sized to hold a vfimg image.
    vhd_path: PathBuf,
}

fn main() {
    env_logger::init();
    std::process::exit(run_cli(std::env::args_os()));
}

/// Parses arguments, mounts the backing file, and runs the command shell to
/// completion. Returns the process exit code rather than calling
/// `std::process::exit` directly, so this path stays unit-testable.
fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return 1;
        }
    };

    let file = match OpenOptions::new().read(true).write(true).open(&cli.vhd_path) {
        Ok(f) => f,
        Err(e) => {
            log::error!("cannot open {}: {e}", cli.vhd_path.display());
            return 1;
        }
    };

    let mut fs = match FileSystem::mount(file) {
        Ok(fs) => fs,
        Err(e) => {
            log::error!("mount failed: {e}");
            return 1;
        }
    };

    run_shell(&mut fs, io::stdin().lock());
    0
}

/// Reads whitespace-tokenised commands from `input` until `quit` or EOF,
/// dispatching each to its handler and logging rather than aborting on a
/// per-command error.
fn run_shell<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, input: impl BufRead) {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stdin read error: {e}");
                break;
            }
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = tokens.first() else { continue };

        match cmd {
            "quit" => break,
            "ls" => run(|| ls(fs, &tokens)),
            "mkdir" => run(|| mknod(fs, &tokens, InodeType::Directory)),
            "touch" => run(|| mknod(fs, &tokens, InodeType::Regular)),
            "stat" => run(|| stat(fs, &tokens)),
            "read" => run(|| read(fs, &tokens)),
            "write" => run(|| write_cmd(fs, &tokens)),
            "migrate" => run(|| migrate(fs, &tokens)),
            "retrieve" => run(|| retrieve(fs, &tokens)),
            other => log::error!("unknown command: {other}"),
        }
    }
}

/// Runs a command closure, logging a returned error rather than aborting
/// the shell loop.
fn run(f: impl FnOnce() -> Result<(), String>) {
    if let Err(e) = f() {
        log::error!("{e}");
    }
}

fn get_arg<'a>(tokens: &[&'a str], i: usize, name: &str) -> Result<&'a str, String> {
    tokens.get(i).copied().ok_or_else(|| format!("{name}: missing argument"))
}

fn ls<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let path = get_arg(tokens, 1, "ls")?;
    let names = fs.ls(path).map_err(|e| e.to_string())?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn mknod<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str], typ: InodeType) -> Result<(), String> {
    let path = get_arg(tokens, 1, tokens[0])?;
    fs.mknod(path, typ).map_err(|e| e.to_string())?;
    Ok(())
}

fn stat<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let path = get_arg(tokens, 1, "stat")?;
    let fd = fs.open(path, AccessMode::ReadOnly).map_err(|e| e.to_string())?;
    let st = fs.stat(fd).map_err(|e| e.to_string());
    fs.close(fd).ok();
    let st = st?;
    println!("type={} size={} linkcnt={}", st.typ, st.size, st.linkcnt);
    Ok(())
}

fn parse_u32(tokens: &[&str], i: usize, name: &str) -> Result<u32, String> {
    get_arg(tokens, i, name)?
        .parse()
        .map_err(|_| format!("{name}: not a number"))
}

fn read<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let path = get_arg(tokens, 1, "read")?;
    let off = parse_u32(tokens, 2, "read")?;
    let sz = parse_u32(tokens, 3, "read")? as usize;
    let fd = fs.open(path, AccessMode::ReadOnly).map_err(|e| e.to_string())?;
    fs.seek(fd, off).map_err(|e| e.to_string())?;
    let mut buf = vec![0u8; sz];
    let n = fs.read(fd, &mut buf).map_err(|e| e.to_string());
    fs.close(fd).ok();
    let n = n? as usize;
    println!("{}", String::from_utf8_lossy(&buf[..n]));
    Ok(())
}

fn write_cmd<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let path = get_arg(tokens, 1, "write")?;
    let off = parse_u32(tokens, 2, "write")?;
    let sz = parse_u32(tokens, 3, "write")? as usize;
    let text = tokens.get(4..).map(|rest| rest.join(" ")).unwrap_or_default();
    let mut data = text.into_bytes();
    data.resize(sz, 0);

    let fd = fs.open(path, AccessMode::WriteOnly).map_err(|e| e.to_string())?;
    fs.seek(fd, off).map_err(|e| e.to_string())?;
    let n = fs.write(fd, &data).map_err(|e| e.to_string());
    fs.close(fd).ok();
    let n = n?;
    log::info!("wrote {n} bytes to {path}");
    Ok(())
}

/// Copies `vfs_path`'s content out to a new host file at `host_path`.
fn migrate<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let vfs_path = get_arg(tokens, 1, "migrate")?;
    let host_path = get_arg(tokens, 2, "migrate")?;

    let fd = fs.open(vfs_path, AccessMode::ReadOnly).map_err(|e| e.to_string())?;
    let size = fs.stat(fd).map_err(|e| e.to_string())?.size as usize;
    let mut buf = vec![0u8; size];
    let n = fs.read(fd, &mut buf).map_err(|e| e.to_string());
    fs.close(fd).ok();
    let n = n?;

    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(host_path)
        .map_err(|e| e.to_string())?;
    out.write_all(&buf[..n as usize]).map_err(|e| e.to_string())?;
    log::info!("migrated {vfs_path} ({n} bytes) to {host_path}");
    Ok(())
}

/// Copies a host file at `host_path` into a new regular file at `vfs_path`.
fn retrieve<D: vfimg::disk::Disk>(fs: &mut FileSystem<D>, tokens: &[&str]) -> Result<(), String> {
    let host_path = get_arg(tokens, 1, "retrieve")?;
    let vfs_path = get_arg(tokens, 2, "retrieve")?;

    let mut buf = Vec::new();
    std::fs::File::open(host_path)
        .map_err(|e| e.to_string())?
        .read_to_end(&mut buf)
        .map_err(|e| e.to_string())?;

    fs.mknod(vfs_path, InodeType::Regular).map_err(|e| e.to_string())?;
    let fd = fs.open(vfs_path, AccessMode::WriteOnly).map_err(|e| e.to_string())?;
    let n = fs.write(fd, &buf).map_err(|e| e.to_string());
    fs.close(fd).ok();
    let n = n?;
    log::info!("retrieved {host_path} ({n} bytes) into {vfs_path}");
    Ok(())
}
