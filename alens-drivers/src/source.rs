// SPDX-License-Identifier: AGPL-3.0-or-later
//! POSIX metadata source
//!
//! [`FileStat::query`] takes one snapshot of everything `stat`, `access`,
//! the user database and `statvfs` can tell about a path. Attribute lookups
//! then read the snapshot; only the sniffed content type touches the disk
//! again, once, on first use.

use alens_core::{AttributeId, AttributeValue, ErrorCode, FileType, IoError};
use std::cell::OnceCell;
use std::ffi::{CStr, CString};
use std::fs;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Access checks against the calling process's credentials
#[derive(Debug, Clone, Copy, Default)]
struct Access {
    read: bool,
    write: bool,
    execute: bool,
    /// Parent directory is writable, so the entry can be deleted or renamed
    parent_write: bool,
}

#[derive(Debug, Clone, Default)]
struct Owner {
    user: Option<String>,
    user_real: Option<String>,
    group: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct FsInfo {
    size: u64,
    free: u64,
    used: u64,
    readonly: bool,
    fs_type: Option<String>,
}

/// Snapshot of a path's metadata
#[derive(Debug)]
pub struct FileStat {
    path: PathBuf,
    /// `lstat` of the path itself
    link: fs::Metadata,
    /// `stat` through a symlink; `None` for a dangling link
    target: Option<fs::Metadata>,
    symlink_target: Option<PathBuf>,
    access: Access,
    owner: Owner,
    fs: Option<FsInfo>,
    is_mountpoint: bool,
    sniff: bool,
    content_type: OnceCell<String>,
}

impl FileStat {
    /// Query `path`, following a final symlink like `stat` would
    ///
    /// `sniff` enables magic-byte content detection for regular files.
    pub fn query(path: &Path, sniff: bool) -> Result<Self, IoError> {
        let link = fs::symlink_metadata(path)?;
        let (target, symlink_target) = if link.file_type().is_symlink() {
            (fs::metadata(path).ok(), fs::read_link(path).ok())
        } else {
            (None, None)
        };

        let meta = target.as_ref().unwrap_or(&link);
        let names = user_names(meta.uid());
        let owner = Owner {
            user: names.as_ref().map(|(name, _)| name.clone()),
            user_real: names.map(|(name, real)| real.unwrap_or(name)),
            group: group_name(meta.gid()),
        };
        let is_mountpoint = meta.is_dir() && is_mountpoint(path, meta);

        Ok(Self {
            path: path.to_path_buf(),
            access: check_access(path),
            owner,
            fs: filesystem_info(path),
            is_mountpoint,
            link,
            target,
            symlink_target,
            sniff,
            content_type: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata used for everything except the symlink attributes
    fn meta(&self) -> &fs::Metadata {
        self.target.as_ref().unwrap_or(&self.link)
    }

    pub fn file_type(&self) -> FileType {
        let file_type = self.meta().file_type();
        if file_type.is_file() {
            FileType::Regular
        } else if file_type.is_dir() {
            FileType::Directory
        } else if file_type.is_symlink() {
            FileType::SymbolicLink
        } else {
            FileType::Special
        }
    }

    fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Value of a well-known attribute; `NotSupported` when the snapshot has
    /// nothing for it
    pub fn attribute(&self, id: AttributeId) -> Result<AttributeValue, IoError> {
        let meta = self.meta();
        let value: AttributeValue = match id {
            AttributeId::STANDARD_TYPE => self.file_type().into(),
            AttributeId::STANDARD_IS_HIDDEN => {
                self.file_name().is_some_and(|n| n.starts_with('.')).into()
            }
            AttributeId::STANDARD_IS_BACKUP => {
                self.file_name().is_some_and(|n| n.ends_with('~')).into()
            }
            AttributeId::STANDARD_IS_SYMLINK => self.link.file_type().is_symlink().into(),
            AttributeId::STANDARD_IS_VIRTUAL | AttributeId::STANDARD_IS_VOLATILE => false.into(),
            AttributeId::STANDARD_NAME
            | AttributeId::STANDARD_DISPLAY_NAME
            | AttributeId::STANDARD_EDIT_NAME
            | AttributeId::STANDARD_COPY_NAME => match self.file_name() {
                Some(name) => name.into(),
                None => "/".into(),
            },
            AttributeId::STANDARD_CONTENT_TYPE => self.content_type().into(),
            AttributeId::STANDARD_FAST_CONTENT_TYPE => self.fast_content_type().into(),
            AttributeId::STANDARD_SIZE => meta.len().into(),
            AttributeId::STANDARD_ALLOCATED_SIZE => (meta.blocks() * 512).into(),
            AttributeId::STANDARD_SYMLINK_TARGET => match &self.symlink_target {
                Some(target) => target.to_string_lossy().into_owned().into(),
                None => return Err(unsupported()),
            },
            AttributeId::ETAG_VALUE => format!("{}:{}", meta.mtime(), meta.mtime_nsec() / 1000).into(),
            AttributeId::ID_FILE => format!("l{}:{}", meta.dev(), meta.ino()).into(),
            AttributeId::ID_FILESYSTEM => format!("l{}", meta.dev()).into(),
            AttributeId::ACCESS_CAN_READ => self.access.read.into(),
            AttributeId::ACCESS_CAN_WRITE => self.access.write.into(),
            AttributeId::ACCESS_CAN_EXECUTE => self.access.execute.into(),
            AttributeId::ACCESS_CAN_DELETE | AttributeId::ACCESS_CAN_RENAME => {
                self.access.parent_write.into()
            }
            AttributeId::TIME_MODIFIED => seconds(meta.mtime()).into(),
            AttributeId::TIME_MODIFIED_USEC => usec(meta.mtime_nsec()).into(),
            AttributeId::TIME_ACCESS => seconds(meta.atime()).into(),
            AttributeId::TIME_ACCESS_USEC => usec(meta.atime_nsec()).into(),
            AttributeId::TIME_CHANGED => seconds(meta.ctime()).into(),
            AttributeId::TIME_CHANGED_USEC => usec(meta.ctime_nsec()).into(),
            AttributeId::TIME_CREATED | AttributeId::TIME_CREATED_USEC => {
                let created = meta
                    .created()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .ok_or_else(unsupported)?;
                if id == AttributeId::TIME_CREATED {
                    created.as_secs().into()
                } else {
                    created.subsec_micros().into()
                }
            }
            AttributeId::UNIX_DEVICE => (meta.dev() as u32).into(),
            AttributeId::UNIX_INODE => meta.ino().into(),
            AttributeId::UNIX_MODE => meta.mode().into(),
            AttributeId::UNIX_NLINK => (meta.nlink() as u32).into(),
            AttributeId::UNIX_UID => meta.uid().into(),
            AttributeId::UNIX_GID => meta.gid().into(),
            AttributeId::UNIX_RDEV => (meta.rdev() as u32).into(),
            AttributeId::UNIX_BLOCK_SIZE => (meta.blksize() as u32).into(),
            AttributeId::UNIX_BLOCKS => meta.blocks().into(),
            AttributeId::UNIX_IS_MOUNTPOINT => self.is_mountpoint.into(),
            AttributeId::OWNER_USER => self.owner.user.clone().ok_or_else(unsupported)?.into(),
            AttributeId::OWNER_USER_REAL => {
                self.owner.user_real.clone().ok_or_else(unsupported)?.into()
            }
            AttributeId::OWNER_GROUP => self.owner.group.clone().ok_or_else(unsupported)?.into(),
            AttributeId::FILESYSTEM_SIZE => self.fs()?.size.into(),
            AttributeId::FILESYSTEM_FREE => self.fs()?.free.into(),
            AttributeId::FILESYSTEM_USED => self.fs()?.used.into(),
            AttributeId::FILESYSTEM_READONLY => self.fs()?.readonly.into(),
            AttributeId::FILESYSTEM_TYPE => self.fs()?.fs_type.clone().ok_or_else(unsupported)?.into(),
            _ => return Err(unsupported()),
        };
        Ok(value)
    }

    fn fs(&self) -> Result<&FsInfo, IoError> {
        self.fs.as_ref().ok_or_else(unsupported)
    }

    /// Content type, sniffed from the first bytes when enabled
    pub fn content_type(&self) -> String {
        self.content_type
            .get_or_init(|| {
                if let Some(special) = self.inode_type() {
                    return special.to_string();
                }
                if self.meta().len() == 0 {
                    return "application/x-zerosize".to_string();
                }
                if self.sniff {
                    if let Ok(Some(kind)) = infer::get_from_path(&self.path) {
                        return kind.mime_type().to_string();
                    }
                }
                guess_from_name(&self.path)
            })
            .clone()
    }

    /// Content type from the name alone
    pub fn fast_content_type(&self) -> String {
        match self.inode_type() {
            Some(special) => special.to_string(),
            None => guess_from_name(&self.path),
        }
    }

    fn inode_type(&self) -> Option<&'static str> {
        if self.target.is_none() && self.link.file_type().is_symlink() {
            return Some("inode/symlink");
        }
        let file_type = self.meta().file_type();
        if file_type.is_dir() {
            Some("inode/directory")
        } else if file_type.is_char_device() {
            Some("inode/chardevice")
        } else if file_type.is_block_device() {
            Some("inode/blockdevice")
        } else if file_type.is_fifo() {
            Some("inode/fifo")
        } else if file_type.is_socket() {
            Some("inode/socket")
        } else {
            None
        }
    }
}

/// Write one attribute to `path`
///
/// Supports `unix::mode`, `unix::uid`, `unix::gid` and the modified and
/// access times with their `-usec` parts. A value of the wrong kind or out
/// of range fails with `EINVAL`. Writing a time that matches the file leaves
/// it untouched, so a cached value read earlier flushes back unchanged.
pub fn write_attribute(path: &Path, id: AttributeId, value: &AttributeValue) -> Result<(), IoError> {
    match id {
        AttributeId::UNIX_MODE => {
            let mode = value.as_u32().ok_or_else(invalid)?;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }
        AttributeId::UNIX_UID => {
            let uid = value.as_u32().ok_or_else(invalid)?;
            std::os::unix::fs::chown(path, Some(uid), None)?;
        }
        AttributeId::UNIX_GID => {
            let gid = value.as_u32().ok_or_else(invalid)?;
            std::os::unix::fs::chown(path, None, Some(gid))?;
        }
        AttributeId::TIME_MODIFIED => {
            write_seconds(path, Stamp::Modified, value.as_u64().ok_or_else(invalid)?)?;
        }
        AttributeId::TIME_MODIFIED_USEC => {
            write_usec(path, Stamp::Modified, value.as_u32().ok_or_else(invalid)?)?;
        }
        AttributeId::TIME_ACCESS => {
            write_seconds(path, Stamp::Access, value.as_u64().ok_or_else(invalid)?)?;
        }
        AttributeId::TIME_ACCESS_USEC => {
            write_usec(path, Stamp::Access, value.as_u32().ok_or_else(invalid)?)?;
        }
        _ => return Err(unsupported()),
    }
    Ok(())
}

fn unsupported() -> IoError {
    IoError::new(ErrorCode::NotSupported)
}

fn invalid() -> IoError {
    IoError::from_errno(libc::EINVAL)
}

fn seconds(secs: i64) -> u64 {
    secs.max(0) as u64
}

fn usec(nsec: i64) -> u32 {
    (nsec.max(0) / 1000) as u32
}

fn guess_from_name(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn c_path(path: &Path) -> Option<CString> {
    CString::new(path.as_os_str().as_bytes()).ok()
}

fn check_access(path: &Path) -> Access {
    let Some(c) = c_path(path) else {
        return Access::default();
    };
    let check = |c: &CStr, mode| unsafe { libc::access(c.as_ptr(), mode) == 0 };

    let parent_write = path
        .parent()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .and_then(c_path)
        .is_some_and(|p| check(p.as_c_str(), libc::W_OK | libc::X_OK));

    Access {
        read: check(c.as_c_str(), libc::R_OK),
        write: check(c.as_c_str(), libc::W_OK),
        execute: check(c.as_c_str(), libc::X_OK),
        parent_write,
    }
}

/// Login name and the real name from the GECOS field
fn user_names(uid: u32) -> Option<(String, Option<String>)> {
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd: libc::passwd = unsafe { mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return None;
    }

    let name = unsafe { CStr::from_ptr(pwd.pw_name) }.to_string_lossy().into_owned();
    let real = if pwd.pw_gecos.is_null() {
        None
    } else {
        let gecos = unsafe { CStr::from_ptr(pwd.pw_gecos) }.to_string_lossy();
        gecos
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some((name, real))
}

fn group_name(gid: u32) -> Option<String> {
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut grp: libc::group = unsafe { mem::zeroed() };
    let mut result: *mut libc::group = std::ptr::null_mut();
    let rc = unsafe { libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() || grp.gr_name.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(grp.gr_name) }.to_string_lossy().into_owned())
}

/// A directory is a mount point when its parent lives on another device, or
/// when it is its own parent (`/`)
fn is_mountpoint(path: &Path, meta: &fs::Metadata) -> bool {
    match fs::metadata(path.join("..")) {
        Ok(parent) => parent.dev() != meta.dev() || parent.ino() == meta.ino(),
        Err(_) => false,
    }
}

fn filesystem_info(path: &Path) -> Option<FsInfo> {
    let c = c_path(path)?;
    let mut stat: libc::statvfs = unsafe { mem::zeroed() };
    if unsafe { libc::statvfs(c.as_ptr(), &mut stat) } != 0 {
        return None;
    }

    let block_size = stat.f_frsize as u64;
    let total_blocks = stat.f_blocks as u64;
    let free_blocks = stat.f_bfree as u64;
    let available_blocks = stat.f_bavail as u64;

    Some(FsInfo {
        size: total_blocks * block_size,
        free: available_blocks * block_size,
        used: total_blocks.saturating_sub(free_blocks) * block_size,
        readonly: stat.f_flag & libc::ST_RDONLY != 0,
        fs_type: filesystem_type(&c),
    })
}

#[cfg(target_os = "linux")]
fn filesystem_type(path: &CStr) -> Option<String> {
    let mut stat: libc::statfs = unsafe { mem::zeroed() };
    if unsafe { libc::statfs(path.as_ptr(), &mut stat) } != 0 {
        return None;
    }
    let name = match stat.f_type as u32 {
        0xEF53 => "ext4",
        0x0102_1994 => "tmpfs",
        0x9123_683E => "btrfs",
        0x5846_5342 => "xfs",
        0x2FC1_2FC1 => "zfs",
        0x6969 => "nfs",
        0x6573_5546 => "fuse",
        0xFF53_4D42 => "cifs",
        0xFE53_4D42 => "smb2",
        0x4D44 => "msdos",
        0x5346_544E => "ntfs",
        0x794C_7630 => "overlay",
        0x9FA0 => "proc",
        0x6265_6572 => "sysfs",
        0x9660 => "isofs",
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(not(target_os = "linux"))]
fn filesystem_type(_path: &CStr) -> Option<String> {
    None
}

#[derive(Debug, Clone, Copy)]
enum Stamp {
    Access,
    Modified,
}

/// Current `(seconds, nanoseconds)` of one timestamp
fn current_time(path: &Path, stamp: Stamp) -> Result<(i64, i64), IoError> {
    let meta = fs::metadata(path)?;
    Ok(match stamp {
        Stamp::Access => (meta.atime(), meta.atime_nsec()),
        Stamp::Modified => (meta.mtime(), meta.mtime_nsec()),
    })
}

/// Set whole seconds; the sub-second part is cleared only if the seconds change
fn write_seconds(path: &Path, stamp: Stamp, secs: u64) -> Result<(), IoError> {
    let secs = libc::time_t::try_from(secs).map_err(|_| invalid())?;
    let (current, _) = current_time(path, stamp)?;
    if i64::from(secs) == current {
        return Ok(());
    }
    set_time(path, stamp, secs, 0)
}

/// Set the microsecond part, keeping the seconds
fn write_usec(path: &Path, stamp: Stamp, usec: u32) -> Result<(), IoError> {
    if usec >= 1_000_000 {
        return Err(invalid());
    }
    let (secs, nsec) = current_time(path, stamp)?;
    if nsec / 1000 == i64::from(usec) {
        return Ok(());
    }
    let secs = libc::time_t::try_from(secs).map_err(|_| invalid())?;
    set_time(path, stamp, secs, i64::from(usec) * 1000)
}

/// `utimensat` with the other timestamp left as `UTIME_OMIT`
fn set_time(path: &Path, stamp: Stamp, secs: libc::time_t, nsec: i64) -> Result<(), IoError> {
    let c = c_path(path).ok_or_else(invalid)?;
    let omit = libc::timespec {
        tv_sec: 0,
        tv_nsec: libc::UTIME_OMIT,
    };
    let value = libc::timespec {
        tv_sec: secs,
        tv_nsec: nsec as _,
    };
    let times = match stamp {
        Stamp::Access => [value, omit],
        Stamp::Modified => [omit, value],
    };
    let rc = unsafe { libc::utimensat(libc::AT_FDCWD, c.as_ptr(), times.as_ptr(), 0) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}
