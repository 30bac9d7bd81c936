//! A swap file planner and reconciler for freshly provisioned Linux hosts.
//!
//! `swapplan` recommends a swap size from the installed memory, then brings
//! the host to that size: it allocates and activates a swap file, makes it
//! persistent in the mount table and tunes `vm.swappiness`. Running it again
//! converges on the same state.

#[cfg(not(unix))]
compile_error!("swapplan only supports unix-like hosts.");

pub mod app;
pub mod collection;
pub mod constants;
pub mod fstab;
pub mod lock;
pub mod options;
pub mod planner;
pub mod prompt;
pub mod reconcile;
pub mod sysctl;
pub mod system;

pub mod utils {
    pub mod error;
    pub mod general;
    pub mod logging;
}
