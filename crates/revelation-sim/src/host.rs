//! Host system calls serviced on the real file system.
//!
//! Descriptors 0, 1 and 2 are the simulator's own standard streams; files
//! opened by the guest get descriptors from 3 upwards. Every call returns
//! `-1` with a newlib `errno` on failure.

use std::collections::BTreeMap;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use revelation_core::{Memory, Syscall, SyscallHandler, SyscallResult, BLOCK_SIZE};

/// `open` flag bits as encoded by newlib.
pub mod flags {
    /// Access mode field.
    pub const ACCMODE: u32 = 0x3;
    /// Write only.
    pub const WRONLY: u32 = 0x1;
    /// Read and write.
    pub const RDWR: u32 = 0x2;
    /// Append on every write.
    pub const APPEND: u32 = 0x0008;
    /// Create when missing.
    pub const CREAT: u32 = 0x0200;
    /// Truncate to zero length.
    pub const TRUNC: u32 = 0x0400;
    /// Fail when the file exists.
    pub const EXCL: u32 = 0x0800;
}

/// newlib error numbers reported in `R3`.
pub mod errno {
    /// No such file or directory.
    pub const ENOENT: u32 = 2;
    /// I/O error.
    pub const EIO: u32 = 5;
    /// Bad file descriptor.
    pub const EBADF: u32 = 9;
    /// Permission denied.
    pub const EACCES: u32 = 13;
    /// File exists.
    pub const EEXIST: u32 = 17;
    /// Invalid argument.
    pub const EINVAL: u32 = 22;
    /// Value too large.
    pub const EOVERFLOW: u32 = 139;
}

/// Size of the guest `struct stat` written by `fstat` and `stat`.
pub const STAT_SIZE: usize = 60;

/// Longest path read from guest memory.
pub const PATH_LIMIT: usize = 4096;

const S_IFCHR: u32 = 0o020_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFREG: u32 = 0o100_000;

/// [`SyscallHandler`] backed by `std::fs` and the given console streams.
#[derive(Debug)]
pub struct HostSyscalls<O = io::Stdout, E = io::Stderr> {
    stdout: O,
    stderr: E,
    files: BTreeMap<u32, File>,
    next_fd: u32,
}

impl HostSyscalls {
    /// Handler writing guest output to the process's stdout and stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_console(io::stdout(), io::stderr())
    }
}

impl Default for HostSyscalls {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> HostSyscalls<O, E> {
    /// Handler writing descriptors 1 and 2 to `stdout` and `stderr`.
    #[must_use]
    pub const fn with_console(stdout: O, stderr: E) -> Self {
        Self {
            stdout,
            stderr,
            files: BTreeMap::new(),
            next_fd: 3,
        }
    }

    /// Stream behind descriptor 1.
    #[must_use]
    pub const fn stdout(&self) -> &O {
        &self.stdout
    }

    /// Stream behind descriptor 2.
    #[must_use]
    pub const fn stderr(&self) -> &E {
        &self.stderr
    }

    /// Number of guest files currently open.
    #[must_use]
    pub fn open_files(&self) -> usize {
        self.files.len()
    }

    fn open(&mut self, path: &Path, mode_flags: u32) -> Result<i32, u32> {
        let mut options = OpenOptions::new();
        match mode_flags & flags::ACCMODE {
            flags::WRONLY => options.write(true),
            flags::RDWR => options.read(true).write(true),
            _ => options.read(true),
        };
        options
            .append(mode_flags & flags::APPEND != 0)
            .truncate(mode_flags & flags::TRUNC != 0);
        if mode_flags & flags::CREAT != 0 {
            if mode_flags & flags::EXCL != 0 {
                options.create_new(true);
            } else {
                options.create(true);
            }
        }
        let file = options.open(path).map_err(|error| errno_of(&error))?;
        let fd = self.next_fd;
        let retval = i32::try_from(fd).map_err(|_| errno::EOVERFLOW)?;
        self.next_fd += 1;
        self.files.insert(fd, file);
        log::debug!("opened {} as fd {fd}", path.display());
        Ok(retval)
    }

    fn close(&mut self, fd: u32) -> Result<i32, u32> {
        match fd {
            0..=2 => Ok(0),
            _ => self.files.remove(&fd).map(|_| 0).ok_or(errno::EBADF),
        }
    }

    fn read(
        &mut self,
        fd: u32,
        buf: u32,
        count: u32,
        memory: &mut Memory,
        coreid: u32,
    ) -> Result<i32, u32> {
        let mut data = vec![0; guest_len(count)];
        let read = match fd {
            0 => io::stdin().read(&mut data),
            1 | 2 => return Err(errno::EBADF),
            _ => self.file(fd)?.read(&mut data),
        }
        .map_err(|error| errno_of(&error))?;
        memory.write_bytes(buf, &data[..read], coreid);
        i32::try_from(read).map_err(|_| errno::EOVERFLOW)
    }

    fn write(
        &mut self,
        fd: u32,
        buf: u32,
        count: u32,
        memory: &Memory,
        coreid: u32,
    ) -> Result<i32, u32> {
        let data = memory.read_bytes(buf, guest_len(count), coreid);
        match fd {
            1 => self
                .stdout
                .write_all(&data)
                .and_then(|()| self.stdout.flush()),
            2 => self
                .stderr
                .write_all(&data)
                .and_then(|()| self.stderr.flush()),
            0 => return Err(errno::EBADF),
            _ => self.file(fd)?.write_all(&data),
        }
        .map_err(|error| errno_of(&error))?;
        i32::try_from(data.len()).map_err(|_| errno::EOVERFLOW)
    }

    fn lseek(&mut self, fd: u32, offset: u32, whence: u32) -> Result<i32, u32> {
        let offset = i64::from(i32::from_le_bytes(offset.to_le_bytes()));
        let target = match whence {
            0 => SeekFrom::Start(u64::try_from(offset).map_err(|_| errno::EINVAL)?),
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            _ => return Err(errno::EINVAL),
        };
        let position = self
            .file(fd)?
            .seek(target)
            .map_err(|error| errno_of(&error))?;
        i32::try_from(position).map_err(|_| errno::EOVERFLOW)
    }

    fn fstat(
        &mut self,
        fd: u32,
        buf: u32,
        memory: &mut Memory,
        coreid: u32,
    ) -> Result<i32, u32> {
        let stat = match fd {
            0..=2 => GuestStat::console(),
            _ => GuestStat::from_metadata(
                &self
                    .file(fd)?
                    .metadata()
                    .map_err(|error| errno_of(&error))?,
            ),
        };
        memory.write_bytes(buf, &stat.to_bytes(), coreid);
        Ok(0)
    }

    fn file(&mut self, fd: u32) -> Result<&mut File, u32> {
        self.files.get_mut(&fd).ok_or(errno::EBADF)
    }
}

impl<O: Write, E: Write> SyscallHandler for HostSyscalls<O, E> {
    fn handle(&mut self, call: Syscall, memory: &mut Memory, coreid: u32) -> SyscallResult {
        let outcome = match call {
            Syscall::Open { path, flags, mode } => {
                log::debug!("core {coreid:#x}: open flags {flags:#x} mode {mode:#o}");
                self.open(&guest_path(memory, path, coreid), flags)
            }
            Syscall::Close { fd } => self.close(fd),
            Syscall::Read { fd, buf, count } => self.read(fd, buf, count, memory, coreid),
            Syscall::Write { fd, buf, count } => self.write(fd, buf, count, memory, coreid),
            Syscall::Lseek { fd, offset, whence } => self.lseek(fd, offset, whence),
            Syscall::Unlink { path } => fs::remove_file(guest_path(memory, path, coreid))
                .map(|()| 0)
                .map_err(|error| errno_of(&error)),
            Syscall::Fstat { fd, buf } => self.fstat(fd, buf, memory, coreid),
            Syscall::Stat { path, buf } => fs::metadata(guest_path(memory, path, coreid))
                .map_err(|error| errno_of(&error))
                .map(|metadata| {
                    let stat = GuestStat::from_metadata(&metadata);
                    memory.write_bytes(buf, &stat.to_bytes(), coreid);
                    0
                }),
            Syscall::Link { src, dst } => fs::hard_link(
                guest_path(memory, src, coreid),
                guest_path(memory, dst, coreid),
            )
            .map(|()| 0)
            .map_err(|error| errno_of(&error)),
        };
        match outcome {
            Ok(retval) => SyscallResult::ok(retval),
            Err(errno) => {
                log::debug!("core {coreid:#x}: {call:?} failed with errno {errno}");
                SyscallResult::err(errno)
            }
        }
    }
}

/// Guest `struct stat` in the newlib layout with 32-bit `time_t`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuestStat {
    /// File type and permission bits.
    pub mode: u32,
    /// Hard link count.
    pub nlink: u16,
    /// Size in bytes, saturated to 32 bits.
    pub size: u32,
    /// Last access, seconds since the epoch.
    pub atime: u32,
    /// Last modification, seconds since the epoch.
    pub mtime: u32,
    /// Last status change, seconds since the epoch.
    pub ctime: u32,
    /// Preferred I/O block size.
    pub blksize: u32,
    /// 512-byte blocks allocated.
    pub blocks: u32,
}

impl GuestStat {
    /// Character device entry reported for the standard streams.
    #[must_use]
    pub const fn console() -> Self {
        Self {
            mode: S_IFCHR | 0o620,
            nlink: 1,
            size: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            blksize: 1024,
            blocks: 0,
        }
    }

    /// Entry describing a host file.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let kind = if metadata.is_dir() { S_IFDIR } else { S_IFREG };
        let permissions = match (metadata.is_dir(), metadata.permissions().readonly()) {
            (true, _) => 0o755,
            (false, true) => 0o444,
            (false, false) => 0o644,
        };
        let seconds = |time: io::Result<std::time::SystemTime>| {
            time.ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX))
        };
        let size = u32::try_from(metadata.len()).unwrap_or(u32::MAX);
        let modified = seconds(metadata.modified());
        Self {
            mode: kind | permissions,
            nlink: 1,
            size,
            atime: seconds(metadata.accessed()),
            mtime: modified,
            ctime: modified,
            blksize: 1024,
            blocks: size.div_ceil(512),
        }
    }

    /// Little-endian image of the structure.
    ///
    /// `st_dev`, `st_ino`, `st_uid`, `st_gid`, `st_rdev` and the spare words
    /// are left zero.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; STAT_SIZE] {
        let mut bytes = [0; STAT_SIZE];
        let mut put = |offset: usize, field: &[u8]| {
            bytes[offset..offset + field.len()].copy_from_slice(field);
        };
        put(4, &self.mode.to_le_bytes());
        put(8, &self.nlink.to_le_bytes());
        put(16, &self.size.to_le_bytes());
        put(20, &self.atime.to_le_bytes());
        put(28, &self.mtime.to_le_bytes());
        put(36, &self.ctime.to_le_bytes());
        put(44, &self.blksize.to_le_bytes());
        put(48, &self.blocks.to_le_bytes());
        bytes
    }
}

fn guest_path(memory: &Memory, addr: u32, coreid: u32) -> PathBuf {
    let raw = memory.read_c_string(addr, PATH_LIMIT, coreid);
    PathBuf::from(String::from_utf8_lossy(&raw).into_owned())
}

fn guest_len(count: u32) -> usize {
    usize::try_from(count).map_or(BLOCK_SIZE, |count| count.min(BLOCK_SIZE))
}

fn errno_of(error: &io::Error) -> u32 {
    match error.kind() {
        io::ErrorKind::NotFound => errno::ENOENT,
        io::ErrorKind::PermissionDenied => errno::EACCES,
        io::ErrorKind::AlreadyExists => errno::EEXIST,
        io::ErrorKind::InvalidInput => errno::EINVAL,
        _ => errno::EIO,
    }
}
