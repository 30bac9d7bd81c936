//! Thin adapters over the host: memory and disk queries, file allocation and
//! the swap subsystem.
//!
//! Reconciliation only talks to the host through [`SwapBackend`], so it can
//! be exercised against a fake.

#[cfg(test)]
pub(crate) mod fake;

use std::{
    ffi::OsStr,
    fs, io,
    path::Path,
    process::{Command, Stdio},
};

use log::debug;

use crate::{
    collection::{
        disks::get_disk_budget, memory::get_memory_profile, swaps::active_swap_areas, DiskBudget,
        MemoryProfile, SwapArea,
    },
    utils::{error::SwapResult, general::bytes_to_mb},
};

/// The host primitives swap planning and reconciliation depend on.
pub trait SwapBackend {
    /// Total memory and currently active swap.
    fn memory_profile(&self) -> SwapResult<MemoryProfile>;

    /// Free space on the filesystem that would host `path`.
    fn disk_budget(&self, path: &Path) -> SwapResult<DiskBudget>;

    /// The swap areas the kernel currently uses.
    fn active_swaps(&self) -> io::Result<Vec<SwapArea>>;

    /// Reserves `size_bytes` for a new file at `path` without writing them.
    /// May be unsupported by the filesystem.
    fn fast_allocate(&self, path: &Path, size_bytes: u64) -> io::Result<()>;

    /// Creates a file at `path` by writing `size_mb` MiB of zeroes.
    fn zero_fill(&self, path: &Path, size_mb: u64) -> io::Result<()>;

    /// Formats `path` as swap space.
    fn mkswap(&self, path: &Path) -> io::Result<()>;

    /// Activates `path` as swap.
    fn swapon(&self, path: &Path) -> io::Result<()>;

    /// Deactivates `path` as swap.
    fn swapoff(&self, path: &Path) -> io::Result<()>;

    /// Applies a kernel parameter to the running system.
    fn apply_sysctl(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Returns the size of an existing regular file at `path` in MiB, if any.
pub fn existing_file_mb(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|metadata| metadata.is_file())
        .map(|metadata| bytes_to_mb(metadata.len()))
}

/// Runs a program to completion, turning a non-zero exit into an error that
/// carries its stderr.
fn run_command(program: &str, args: &[&OsStr]) -> io::Result<()> {
    debug!("Executing: {program} {args:?}");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| io::Error::new(err.kind(), format!("unable to run {program}: {err}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(io::Error::other(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

/// The real host.
#[derive(Debug, Default)]
pub struct HostBackend;

impl SwapBackend for HostBackend {
    fn memory_profile(&self) -> SwapResult<MemoryProfile> {
        get_memory_profile()
    }

    fn disk_budget(&self, path: &Path) -> SwapResult<DiskBudget> {
        get_disk_budget(path)
    }

    fn active_swaps(&self) -> io::Result<Vec<SwapArea>> {
        active_swap_areas()
    }

    fn fast_allocate(&self, path: &Path, size_bytes: u64) -> io::Result<()> {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "linux")] {
                let file = fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(path)?;
                rustix::fs::fallocate(&file, rustix::fs::FallocateFlags::empty(), 0, size_bytes)?;
                file.sync_all()
            } else {
                let _ = (path, size_bytes);
                Err(io::Error::from(io::ErrorKind::Unsupported))
            }
        }
    }

    fn zero_fill(&self, path: &Path, size_mb: u64) -> io::Result<()> {
        let of = format!("of={}", path.display());
        let count = format!("count={size_mb}");
        run_command(
            "dd",
            &[
                OsStr::new("if=/dev/zero"),
                OsStr::new(&of),
                OsStr::new("bs=1M"),
                OsStr::new(&count),
                OsStr::new("status=none"),
            ],
        )
    }

    fn mkswap(&self, path: &Path) -> io::Result<()> {
        run_command("mkswap", &[path.as_os_str()])
    }

    fn swapon(&self, path: &Path) -> io::Result<()> {
        run_command("swapon", &[path.as_os_str()])
    }

    fn swapoff(&self, path: &Path) -> io::Result<()> {
        run_command("swapoff", &[path.as_os_str()])
    }

    fn apply_sysctl(&self, key: &str, value: &str) -> io::Result<()> {
        let assignment = format!("{key}={value}");
        run_command("sysctl", &[OsStr::new("-w"), OsStr::new(&assignment)])
    }
}
