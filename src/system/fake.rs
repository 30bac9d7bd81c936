//! An in-memory [`SwapBackend`] for tests. Files are real (inside a temp
//! directory) so sizes and permissions can be checked, but the swap subsystem
//! is simulated.

use std::{
    cell::RefCell,
    fs, io,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use crate::{
    collection::{DiskBudget, MemoryProfile, SwapArea},
    system::SwapBackend,
    utils::{
        error::SwapResult,
        general::{bytes_to_mb, swap_bytes_to_mb},
    },
};

const HEADER_PAGE_KB: u64 = 4;

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    /// Active swap files and their size in KiB, as the kernel reports it.
    pub(crate) active: Vec<(PathBuf, u64)>,
    /// Every call made, in order.
    pub(crate) calls: Vec<String>,
    /// Applied sysctl values.
    pub(crate) sysctl: Vec<(String, String)>,
}

#[derive(Debug)]
pub(crate) struct FakeBackend {
    pub(crate) total_mem_mb: u64,
    /// Swap from areas swapplan does not manage, such as a partition.
    pub(crate) other_swap_mb: u64,
    pub(crate) budget: DiskBudget,
    pub(crate) fast_allocate_unsupported: bool,
    /// Makes allocations come out this many MiB short.
    pub(crate) short_by_mb: u64,
    pub(crate) fail_mkswap: bool,
    pub(crate) fail_swapon: bool,
    pub(crate) fail_swapoff: bool,
    pub(crate) state: RefCell<FakeState>,
}

impl FakeBackend {
    pub(crate) fn new(total_mem_mb: u64) -> Self {
        Self {
            total_mem_mb,
            other_swap_mb: 0,
            budget: DiskBudget::new(100_000, 200_000),
            fast_allocate_unsupported: false,
            short_by_mb: 0,
            fail_mkswap: false,
            fail_swapon: false,
            fail_swapoff: false,
            state: RefCell::new(FakeState::default()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn is_active(&self, path: &Path) -> bool {
        self.state.borrow().active.iter().any(|(p, _)| p == path)
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create_sized(&self, path: &Path, size_mb: u64) -> io::Result<()> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(size_mb.saturating_sub(self.short_by_mb) * 1024 * 1024)
    }
}

impl SwapBackend for FakeBackend {
    fn memory_profile(&self) -> SwapResult<MemoryProfile> {
        let active_kb: u64 = self.state.borrow().active.iter().map(|(_, kb)| kb).sum();
        Ok(MemoryProfile::new(
            self.total_mem_mb,
            self.other_swap_mb + swap_bytes_to_mb(active_kb * 1024),
        ))
    }

    fn disk_budget(&self, _path: &Path) -> SwapResult<DiskBudget> {
        Ok(self.budget)
    }

    fn active_swaps(&self) -> io::Result<Vec<SwapArea>> {
        Ok(self
            .state
            .borrow()
            .active
            .iter()
            .map(|(path, kb)| SwapArea {
                path: path.clone(),
                kind: "file".to_string(),
                size_kb: *kb,
                used_kb: 0,
            })
            .collect())
    }

    fn fast_allocate(&self, path: &Path, size_bytes: u64) -> io::Result<()> {
        self.record(format!("fallocate {}", bytes_to_mb(size_bytes)));
        if self.fast_allocate_unsupported {
            // Leave a partial file behind, like a failed fallocate can.
            fs::write(path, b"partial")?;
            return Err(io::Error::from(io::ErrorKind::Unsupported));
        }
        self.create_sized(path, bytes_to_mb(size_bytes))
    }

    fn zero_fill(&self, path: &Path, size_mb: u64) -> io::Result<()> {
        self.record(format!("dd {size_mb}"));
        self.create_sized(path, size_mb)
    }

    fn mkswap(&self, path: &Path) -> io::Result<()> {
        let mode = fs::metadata(path)?.permissions().mode() & 0o777;
        self.record(format!("mkswap {mode:o}"));
        if mode != 0o600 {
            return Err(io::Error::other("refusing to format a readable swap file"));
        }
        if self.fail_mkswap {
            return Err(io::Error::other("mkswap: error"));
        }
        Ok(())
    }

    fn swapon(&self, path: &Path) -> io::Result<()> {
        self.record("swapon".to_string());
        // The header page is not counted as swap space.
        let size_kb = (fs::metadata(path)?.len() / 1024).saturating_sub(HEADER_PAGE_KB);
        let mut state = self.state.borrow_mut();
        state.active.push((path.to_path_buf(), size_kb));
        if self.fail_swapon {
            // swapon may have registered the area before failing.
            return Err(io::Error::other("swapon: Invalid argument"));
        }
        Ok(())
    }

    fn swapoff(&self, path: &Path) -> io::Result<()> {
        self.record("swapoff".to_string());
        if self.fail_swapoff {
            return Err(io::Error::other("swapoff: Device or resource busy"));
        }
        self.state.borrow_mut().active.retain(|(p, _)| p != path);
        Ok(())
    }

    fn apply_sysctl(&self, key: &str, value: &str) -> io::Result<()> {
        self.record(format!("sysctl {key}={value}"));
        self.state
            .borrow_mut()
            .sysctl
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
