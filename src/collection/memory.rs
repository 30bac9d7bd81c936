//! Memory data collection.

pub(crate) use self::sysinfo::get_memory_profile;

pub mod sysinfo;

/// Memory and swap of the host, sampled once at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryProfile {
    /// Total installed RAM, in MiB.
    pub total_mem_mb: u64,
    /// Currently active swap across all swap areas, in MiB.
    pub current_swap_mb: u64,
}

impl MemoryProfile {
    pub fn new(total_mem_mb: u64, current_swap_mb: u64) -> Self {
        Self {
            total_mem_mb,
            current_swap_mb,
        }
    }

    /// Returns a copy with either value replaced, used to plan for a
    /// hypothetical host.
    pub fn with_overrides(self, total_mem_mb: Option<u64>, current_swap_mb: Option<u64>) -> Self {
        Self {
            total_mem_mb: total_mem_mb.unwrap_or(self.total_mem_mb),
            current_swap_mb: current_swap_mb.unwrap_or(self.current_swap_mb),
        }
    }
}
