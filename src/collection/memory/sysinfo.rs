//! Collecting memory data using sysinfo.

use std::num::NonZeroU64;

use sysinfo::System;

use crate::{
    collection::memory::MemoryProfile,
    utils::{
        error::{SwapError, SwapResult},
        general::{bytes_to_mb, swap_bytes_to_mb},
    },
};

/// Returns the memory profile of the host. A host reporting no memory at all
/// is treated as unreadable rather than planned for.
pub(crate) fn get_memory_profile() -> SwapResult<MemoryProfile> {
    let mut sys = System::new();
    sys.refresh_memory();

    let total = NonZeroU64::new(sys.total_memory())
        .ok_or_else(|| SwapError::host("the host reported 0 bytes of memory"))?;

    Ok(MemoryProfile {
        total_mem_mb: bytes_to_mb(total.get()),
        current_swap_mb: swap_bytes_to_mb(sys.total_swap()),
    })
}
