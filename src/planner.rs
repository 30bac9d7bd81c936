//! Deciding how much swap a host should have, and whether to act on it.

use std::{fmt, sync::OnceLock};

use regex::Regex;

use crate::{
    collection::{DiskBudget, MemoryProfile},
    constants::MIN_SWAP_SIZE_MB,
    utils::error::{SwapError, SwapResult},
};

/// Recommended swap sizes, as `(exclusive upper bound of RAM, swap)` pairs in
/// MiB. Anything at or above the last bound gets [`MAX_RECOMMENDED_MB`].
pub const SWAP_SIZE_TABLE: [(u64, u64); 6] = [
    (512, 1024),
    (1024, 1536),
    (2048, 2048),
    (4096, 3072),
    (8192, 4096),
    (16384, 6144),
];

pub const MAX_RECOMMENDED_MB: u64 = 8192;

/// Returns the recommended swap size in MiB for a host with `total_mem_mb` of
/// RAM.
pub fn recommend(total_mem_mb: u64) -> u64 {
    SWAP_SIZE_TABLE
        .iter()
        .find(|(upper, _)| total_mem_mb < *upper)
        .map(|(_, swap)| *swap)
        .unwrap_or(MAX_RECOMMENDED_MB)
}

/// What reconciliation has to do to reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    /// The host already has at least the target amount of swap.
    NoActionNeeded,
    /// No swap file exists yet at the configured path.
    Create,
    /// A swap file exists and gets replaced.
    Resize,
}

impl fmt::Display for SwapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapAction::NoActionNeeded => write!(f, "no action needed"),
            SwapAction::Create => write!(f, "create"),
            SwapAction::Resize => write!(f, "resize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    pub recommended_mb: u64,
    pub target_mb: u64,
    pub action: SwapAction,
}

impl SwapPlan {
    /// Whether the target came from the operator rather than the table.
    pub fn is_overridden(&self) -> bool {
        self.recommended_mb != self.target_mb
    }
}

fn size_pattern() -> &'static Regex {
    static SIZE_PATTERN: OnceLock<Regex> = OnceLock::new();

    SIZE_PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("the size pattern is valid"))
}

/// Parses a user-supplied size in MiB. Only plain digits are accepted: no
/// sign, no decimals, no units.
pub fn parse_size_override(raw: &str) -> SwapResult<u64> {
    if !size_pattern().is_match(raw) {
        return Err(SwapError::validation(format!(
            "'{raw}' is not a whole number of MiB"
        )));
    }

    raw.parse::<u64>()
        .map_err(|_| SwapError::validation(format!("'{raw}' is too large")))
}

/// Sizes swap for a host.
#[derive(Debug, Clone, Copy)]
pub struct SwapPlanner {
    min_size_mb: u64,
}

impl Default for SwapPlanner {
    fn default() -> Self {
        Self {
            min_size_mb: MIN_SWAP_SIZE_MB,
        }
    }
}

impl SwapPlanner {
    /// Creates a planner with a raised size floor. The floor can never go
    /// below [`MIN_SWAP_SIZE_MB`].
    pub fn with_min_size(min_size_mb: u64) -> Self {
        Self {
            min_size_mb: min_size_mb.max(MIN_SWAP_SIZE_MB),
        }
    }

    pub fn min_size_mb(&self) -> u64 {
        self.min_size_mb
    }

    /// Computes a [`SwapPlan`].
    ///
    /// An invalid override is an error, never a silent fallback to the
    /// recommendation. The disk budget only matters when something will be
    /// allocated, so it is not checked when no action is needed.
    pub fn plan(
        &self, profile: &MemoryProfile, size_override: Option<&str>, swap_file_exists: bool,
        budget: &DiskBudget,
    ) -> SwapResult<SwapPlan> {
        let recommended_mb = recommend(profile.total_mem_mb);
        let target_mb = match size_override {
            Some(raw) => parse_size_override(raw)?,
            None => recommended_mb,
        };

        if target_mb < self.min_size_mb {
            return Err(SwapError::validation(format!(
                "{target_mb} MiB is below the minimum of {} MiB",
                self.min_size_mb
            )));
        }

        let action = if target_mb <= profile.current_swap_mb {
            SwapAction::NoActionNeeded
        } else if swap_file_exists {
            SwapAction::Resize
        } else {
            SwapAction::Create
        };

        if action != SwapAction::NoActionNeeded && target_mb > budget.usable_mb() {
            return Err(SwapError::validation(format!(
                "{target_mb} MiB does not fit on disk; {} MiB is free and {} MiB must stay free",
                budget.free_mb,
                budget.reserve_mb()
            )));
        }

        Ok(SwapPlan {
            recommended_mb,
            target_mb,
            action,
        })
    }
}
