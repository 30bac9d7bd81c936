//! Running a single swapplan command against a host.

use std::{fmt, path::PathBuf};

use log::info;

use crate::{
    collection::{MemoryProfile, SwapArea},
    constants::SWAPPINESS_KEY,
    fstab::{FstabState, MountTable},
    lock::RunLock,
    options::{SwapCommand, SwapOptions},
    planner::{recommend, SwapAction, SwapPlan, SwapPlanner},
    prompt::Prompter,
    reconcile::{ReconcileReport, ReconcileStep, Reconciler},
    sysctl::SysctlConf,
    system::{existing_file_mb, SwapBackend},
    utils::{
        error::{SwapError, SwapResult},
        general::swap_bytes_to_mb,
    },
};

/// What a run produced, ready to be shown to the operator.
#[derive(Debug)]
pub enum RunOutcome {
    Planned {
        profile: MemoryProfile,
        plan: SwapPlan,
    },
    Applied {
        profile: MemoryProfile,
        plan: SwapPlan,
        report: ReconcileReport,
        /// Active swap once the run finished. Not sampled on dry runs.
        final_swap_mb: Option<u64>,
    },
    Status(StatusReport),
}

/// A read-only snapshot of the host's swap setup.
#[derive(Debug)]
pub struct StatusReport {
    pub profile: MemoryProfile,
    pub active_swaps: Vec<SwapArea>,
    pub swap_file: PathBuf,
    pub swap_file_mb: Option<u64>,
    pub fstab_state: FstabState,
    pub fstab_swap_entries: Vec<String>,
    pub backup_path: PathBuf,
    pub backup_exists: bool,
    pub swappiness: Option<String>,
    pub recommended_mb: u64,
    /// What `apply` would do, or why it could not.
    pub plan: Result<SwapPlan, String>,
}

/// Runs the command in `options`.
pub fn run<B: SwapBackend, P: Prompter>(
    options: &SwapOptions, backend: &B, prompter: &P,
) -> SwapResult<RunOutcome> {
    match &options.command {
        SwapCommand::Plan {
            size,
            memory_mb,
            current_swap_mb,
        } => plan(options, backend, size.as_deref(), *memory_mb, *current_swap_mb),
        SwapCommand::Apply { size, assume_yes } => {
            apply(options, backend, prompter, size.as_deref(), *assume_yes)
        }
        SwapCommand::Status => status(options, backend).map(RunOutcome::Status),
    }
}

/// Changing swap needs root. Everything else, including a dry run, can be
/// done by anyone.
pub fn check_privileges(options: &SwapOptions, is_root: bool) -> SwapResult<()> {
    if matches!(options.command, SwapCommand::Apply { .. }) && !options.dry_run && !is_root {
        return Err(SwapError::Permission(
            "apply must run as root, or use --dry-run to see what it would do".into(),
        ));
    }

    Ok(())
}

/// Plans against the host, or a hypothetical one if both overrides are given.
fn plan<B: SwapBackend>(
    options: &SwapOptions, backend: &B, size: Option<&str>, memory_mb: Option<u64>,
    current_swap_mb: Option<u64>,
) -> SwapResult<RunOutcome> {
    let profile = match (memory_mb, current_swap_mb) {
        (Some(total), Some(current)) => MemoryProfile::new(total, current),
        _ => backend
            .memory_profile()?
            .with_overrides(memory_mb, current_swap_mb),
    };

    let plan = plan_for(options, backend, &profile, size)?;
    Ok(RunOutcome::Planned { profile, plan })
}

fn plan_for<B: SwapBackend>(
    options: &SwapOptions, backend: &B, profile: &MemoryProfile, size: Option<&str>,
) -> SwapResult<SwapPlan> {
    let swap_file_mb = existing_file_mb(&options.swap_file);
    let budget = backend
        .disk_budget(&options.swap_file)?
        .with_reclaimable(swap_file_mb.unwrap_or(0));

    SwapPlanner::with_min_size(options.min_size_mb).plan(
        profile,
        size,
        swap_file_mb.is_some(),
        &budget,
    )
}

/// Asks whether to take the recommendation, and for a size if not.
fn choose_size<P: Prompter>(prompter: &P, recommended_mb: u64) -> SwapResult<Option<String>> {
    if prompter.confirm(&format!("Use the recommended {recommended_mb} MiB of swap?"), true)? {
        Ok(None)
    } else {
        let size = prompter.input("Swap size in MiB")?;
        Ok(Some(size.trim().to_string()))
    }
}

fn apply<B: SwapBackend, P: Prompter>(
    options: &SwapOptions, backend: &B, prompter: &P, size: Option<&str>, assume_yes: bool,
) -> SwapResult<RunOutcome> {
    let _lock = if options.dry_run {
        None
    } else {
        Some(RunLock::acquire(&options.lock_file)?)
    };

    let profile = backend.memory_profile()?;
    info!(
        "Detected {} MiB of memory and {} MiB of active swap",
        profile.total_mem_mb, profile.current_swap_mb
    );

    let chosen = match size {
        Some(size) => Some(size.to_string()),
        None if assume_yes => None,
        None => choose_size(prompter, recommend(profile.total_mem_mb))?,
    };

    let plan = plan_for(options, backend, &profile, chosen.as_deref())?;
    info!("Planned {} MiB of swap: {}", plan.target_mb, plan.action);

    let report = Reconciler::new(
        backend,
        MountTable::new(&options.fstab, &options.fstab_backup),
        SysctlConf::new(&options.sysctl_conf),
        options.swappiness,
    )
    .dry_run(options.dry_run)
    .reconcile(&plan, &options.swap_file)?;

    let final_swap_mb = if options.dry_run || plan.action == SwapAction::NoActionNeeded {
        None
    } else {
        Some(backend.memory_profile()?.current_swap_mb)
    };

    Ok(RunOutcome::Applied {
        profile,
        plan,
        report,
        final_swap_mb,
    })
}

fn status<B: SwapBackend>(options: &SwapOptions, backend: &B) -> SwapResult<StatusReport> {
    let profile = backend.memory_profile()?;
    let active_swaps = backend.active_swaps()?;
    let mount_table = MountTable::new(&options.fstab, &options.fstab_backup);
    let sysctl = SysctlConf::new(&options.sysctl_conf);

    Ok(StatusReport {
        active_swaps,
        swap_file: options.swap_file.clone(),
        swap_file_mb: existing_file_mb(&options.swap_file),
        fstab_state: mount_table.state(&options.swap_file)?,
        fstab_swap_entries: mount_table.swap_entries()?,
        backup_path: mount_table.backup_path().to_path_buf(),
        backup_exists: mount_table.has_backup(),
        swappiness: sysctl.get(SWAPPINESS_KEY)?,
        recommended_mb: recommend(profile.total_mem_mb),
        plan: plan_for(options, backend, &profile, None).map_err(|err: SwapError| err.to_string()),
        profile,
    })
}

fn write_plan(f: &mut fmt::Formatter<'_>, profile: &MemoryProfile, plan: &SwapPlan) -> fmt::Result {
    writeln!(f, "Memory:        {} MiB", profile.total_mem_mb)?;
    writeln!(f, "Current swap:  {} MiB", profile.current_swap_mb)?;
    writeln!(f, "Recommended:   {} MiB", plan.recommended_mb)?;
    if plan.is_overridden() {
        writeln!(f, "Requested:     {} MiB", plan.target_mb)?;
    }
    write!(f, "Action:        {}", plan.action)
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Planned { profile, plan } => write_plan(f, profile, plan),
            RunOutcome::Applied {
                profile,
                plan,
                report,
                final_swap_mb,
            } => {
                write_plan(f, profile, plan)?;

                for outcome in &report.steps {
                    let prefix = if report.dry_run { "[DRY-RUN] " } else { "" };
                    write!(
                        f,
                        "\n{prefix}[{}/{}] {}: {}",
                        outcome.step.number(),
                        ReconcileStep::ALL.len(),
                        outcome.step,
                        outcome.detail
                    )?;
                }
                for warning in &report.warnings {
                    write!(f, "\nWarning: {warning}")?;
                }

                if let Some(final_swap_mb) = final_swap_mb {
                    write!(f, "\nSwap is now {final_swap_mb} MiB.")?;
                }

                Ok(())
            }
            RunOutcome::Status(status) => write!(f, "{status}"),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory:        {} MiB", self.profile.total_mem_mb)?;
        writeln!(f, "Current swap:  {} MiB", self.profile.current_swap_mb)?;

        if self.active_swaps.is_empty() {
            writeln!(f, "Active swap:   none")?;
        } else {
            writeln!(f, "Active swap:")?;
            for area in &self.active_swaps {
                writeln!(
                    f,
                    "  {} ({}, {} MiB, {} MiB used)",
                    area.path.display(),
                    area.kind,
                    swap_bytes_to_mb(area.size_kb.saturating_mul(1024)),
                    area.used_kb / 1024
                )?;
            }
        }

        match self.swap_file_mb {
            Some(size_mb) => writeln!(f, "Swap file:     {} ({size_mb} MiB)", self.swap_file.display())?,
            None => writeln!(f, "Swap file:     {} (missing)", self.swap_file.display())?,
        }

        writeln!(f, "Mount table:   {}", self.fstab_state)?;
        for entry in &self.fstab_swap_entries {
            writeln!(f, "  {entry}")?;
        }

        if self.backup_exists {
            writeln!(f, "Backup:        {}", self.backup_path.display())?;
        } else {
            writeln!(f, "Backup:        none")?;
        }

        match &self.swappiness {
            Some(value) => writeln!(f, "Swappiness:    {SWAPPINESS_KEY}={value}")?,
            None => writeln!(f, "Swappiness:    not set")?,
        }

        writeln!(f, "Recommended:   {} MiB", self.recommended_mb)?;
        match &self.plan {
            Ok(plan) => write!(f, "Action:        {}", plan.action),
            Err(reason) => write!(f, "Action:        cannot apply ({reason})"),
        }
    }
}
