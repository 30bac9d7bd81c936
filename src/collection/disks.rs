//! Free space on the filesystem that hosts the swap file.

use std::{
    ffi::CString,
    io, mem,
    path::{Path, PathBuf},
};

use crate::{
    constants::{DISK_RESERVE_PERCENT, MIN_DISK_RESERVE_MB},
    utils::{
        error::{SwapError, SwapResult},
        general::bytes_to_mb,
    },
};

/// Space on a filesystem available for a new swap file, in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskBudget {
    /// Space available to unprivileged writers.
    pub free_mb: u64,
    /// Total size of the filesystem.
    pub capacity_mb: u64,
}

impl DiskBudget {
    pub fn new(free_mb: u64, capacity_mb: u64) -> Self {
        Self {
            free_mb,
            capacity_mb,
        }
    }

    /// Adds space that will be released before allocation, such as an
    /// existing swap file that is about to be replaced.
    pub fn with_reclaimable(self, reclaimable_mb: u64) -> Self {
        Self {
            free_mb: self.free_mb.saturating_add(reclaimable_mb),
            capacity_mb: self.capacity_mb,
        }
    }

    /// Space that must stay free: 5% of the filesystem, but at least 256 MiB.
    pub fn reserve_mb(&self) -> u64 {
        (self.capacity_mb * DISK_RESERVE_PERCENT / 100).max(MIN_DISK_RESERVE_MB)
    }

    /// The largest swap file that still leaves the reserve free.
    pub fn usable_mb(&self) -> u64 {
        self.free_mb.saturating_sub(self.reserve_mb())
    }
}

/// Returns the closest ancestor of `path` that exists. The swap file itself
/// usually does not exist yet, so the filesystem has to be found through its
/// directory.
fn existing_ancestor(path: &Path) -> PathBuf {
    path.ancestors()
        .skip(1)
        .find(|ancestor| !ancestor.as_os_str().is_empty() && ancestor.exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the [`DiskBudget`] of the filesystem that would host `swap_file`.
pub fn get_disk_budget(swap_file: &Path) -> SwapResult<DiskBudget> {
    let dir = existing_ancestor(swap_file);

    let c_path = dir
        .to_str()
        .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))
        .and_then(|string| {
            CString::new(string).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))
        })
        .map_err(|e| SwapError::host(format!("invalid path '{}': {e}", dir.display())))?;

    let mut vfs = mem::MaybeUninit::<libc::statvfs>::uninit();

    // SAFETY: libc call, `c_path` is a valid C string and buf is a valid pointer to
    // write to.
    let result = unsafe { libc::statvfs(c_path.as_ptr(), vfs.as_mut_ptr()) };

    if result == 0 {
        // SAFETY: If result is 0, it succeeded, and vfs should be initialized.
        let vfs = unsafe { vfs.assume_init() };

        // Some of these fields are u32 on 32-bit targets.
        #[allow(clippy::unnecessary_cast)]
        let fragment = vfs.f_frsize as u64;
        #[allow(clippy::unnecessary_cast)]
        let (blocks, available) = (vfs.f_blocks as u64, vfs.f_bavail as u64);

        Ok(DiskBudget {
            free_mb: bytes_to_mb(available.saturating_mul(fragment)),
            capacity_mb: bytes_to_mb(blocks.saturating_mul(fragment)),
        })
    } else {
        Err(SwapError::host(format!(
            "statvfs could not read '{}': {}",
            dir.display(),
            io::Error::last_os_error()
        )))
    }
}
