//! Reading the host state that swap planning is based on.
//!
//! Everything here is read-only. Memory comes from sysinfo, free disk space
//! from statvfs, and the active swap areas from `/proc/swaps`.

pub mod disks;
pub mod memory;
pub mod swaps;

pub use disks::DiskBudget;
pub use memory::MemoryProfile;
pub use swaps::SwapArea;
