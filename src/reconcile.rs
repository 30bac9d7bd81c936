//! Bringing the host to a [`SwapPlan`].
//!
//! Reconciliation runs a fixed sequence of [`ReconcileStep`]s. Each step must
//! succeed before the next runs; the first failure stops the sequence and is
//! reported with the step it happened in. Steps that have already completed
//! are not rolled back, with one exception: a swap file that was allocated
//! but never made it to active use is always removed again.

use std::{fmt, fs, io, os::unix::fs::PermissionsExt, path::Path};

use log::{info, warn};

use crate::{
    constants::SWAPPINESS_KEY,
    fstab::MountTable,
    planner::{SwapAction, SwapPlan},
    sysctl::SysctlConf,
    system::SwapBackend,
    utils::{
        error::{SwapError, SwapResult},
        general::mb_to_bytes,
    },
};

/// The steps of a reconciliation, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReconcileStep {
    DeactivateExisting,
    RemoveOwnEntries,
    RemoveSwapFile,
    BackupMountTable,
    DisableOtherSwaps,
    Allocate,
    RestrictPermissions,
    Activate,
    AddMountEntry,
    TuneSwappiness,
}

impl ReconcileStep {
    pub const ALL: [ReconcileStep; 10] = [
        ReconcileStep::DeactivateExisting,
        ReconcileStep::RemoveOwnEntries,
        ReconcileStep::RemoveSwapFile,
        ReconcileStep::BackupMountTable,
        ReconcileStep::DisableOtherSwaps,
        ReconcileStep::Allocate,
        ReconcileStep::RestrictPermissions,
        ReconcileStep::Activate,
        ReconcileStep::AddMountEntry,
        ReconcileStep::TuneSwappiness,
    ];

    /// The 1-based position of this step.
    pub fn number(&self) -> usize {
        *self as usize + 1
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileStep::DeactivateExisting => "deactivate the existing swap file",
            ReconcileStep::RemoveOwnEntries => "remove old mount table entries",
            ReconcileStep::RemoveSwapFile => "remove the existing swap file",
            ReconcileStep::BackupMountTable => "back up the mount table",
            ReconcileStep::DisableOtherSwaps => "disable other swap entries",
            ReconcileStep::Allocate => "allocate the swap file",
            ReconcileStep::RestrictPermissions => "restrict swap file permissions",
            ReconcileStep::Activate => "format and activate the swap file",
            ReconcileStep::AddMountEntry => "add the mount table entry",
            ReconcileStep::TuneSwappiness => "tune swappiness",
        };

        write!(f, "{name}")
    }
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: ReconcileStep,
    pub detail: String,
}

/// What a reconciliation did, step by step.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub steps: Vec<StepOutcome>,
    /// Problems that did not stop the run, such as mount table lines that
    /// were left alone.
    pub warnings: Vec<SwapError>,
    pub dry_run: bool,
}

impl ReconcileReport {
    fn record<D: Into<String>>(&mut self, step: ReconcileStep, detail: D) {
        let detail = detail.into();
        if self.dry_run {
            info!("[DRY-RUN] Step {} ({step}): {detail}", step.number());
        } else {
            info!("Step {} ({step}): {detail}", step.number());
        }
        self.steps.push(StepOutcome { step, detail });
    }

    /// Returns the outcome of `step`, if it ran.
    pub fn outcome(&self, step: ReconcileStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|outcome| outcome.step == step)
    }
}

/// How the swap file was allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMethod {
    Fast,
    ZeroFill,
}

/// Runs reconciliations against one host.
pub struct Reconciler<'a, B: SwapBackend> {
    backend: &'a B,
    mount_table: MountTable,
    sysctl: SysctlConf,
    swappiness: u8,
    dry_run: bool,
}

impl<'a, B: SwapBackend> Reconciler<'a, B> {
    pub fn new(backend: &'a B, mount_table: MountTable, sysctl: SysctlConf, swappiness: u8) -> Self {
        Self {
            backend,
            mount_table,
            sysctl,
            swappiness,
            dry_run: false,
        }
    }

    /// In a dry run nothing is changed; the report lists what would happen.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Brings the host to `plan`, with the swap file at `swap_file`.
    ///
    /// Does nothing if the plan needs no action. The caller is expected to
    /// hold the [`RunLock`](crate::lock::RunLock).
    pub fn reconcile(&self, plan: &SwapPlan, swap_file: &Path) -> SwapResult<ReconcileReport> {
        let mut report = ReconcileReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        if plan.action == SwapAction::NoActionNeeded {
            return Ok(report);
        }

        info!(
            "Reconciling {} to {} MiB ({})",
            swap_file.display(),
            plan.target_mb,
            plan.action
        );

        self.deactivate_existing(swap_file, &mut report)?;
        self.remove_own_entries(swap_file, &mut report)?;
        self.remove_swap_file(swap_file, &mut report)?;
        self.backup_mount_table(&mut report)?;
        self.disable_other_swaps(swap_file, &mut report)?;

        // Until the mount table references it, a new swap file is removed again on
        // any failure.
        let prepared = self
            .allocate(swap_file, plan.target_mb, &mut report)
            .and_then(|()| self.restrict_permissions(swap_file, &mut report))
            .and_then(|()| self.activate(swap_file, &mut report));
        if let Err(err) = prepared {
            if !self.dry_run {
                self.discard_swap_file(swap_file);
            }
            return Err(err);
        }

        self.add_mount_entry(swap_file, &mut report)?;
        self.tune_swappiness(&mut report)?;

        Ok(report)
    }

    fn deactivate_existing(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::DeactivateExisting;

        let is_active = self
            .backend
            .active_swaps()
            .map_err(|err| SwapError::resource(STEP, format!("unable to list swap areas: {err}")))?
            .iter()
            .any(|area| area.is_backed_by(swap_file));

        if !is_active {
            report.record(STEP, "not active");
        } else if self.dry_run {
            report.record(STEP, format!("would run swapoff {}", swap_file.display()));
        } else {
            self.backend
                .swapoff(swap_file)
                .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
            report.record(STEP, format!("deactivated {}", swap_file.display()));
        }

        Ok(())
    }

    fn remove_own_entries(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::RemoveOwnEntries;

        if self.dry_run {
            let content = self.mount_table.read().map_err(|err| read_error(STEP, err))?;
            let (_, removed) = crate::fstab::remove_entries(&content, swap_file);
            report.record(STEP, format!("would remove {removed} line(s)"));
            return Ok(());
        }

        let removed = self
            .mount_table
            .remove_entries_for(swap_file)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
        report.record(STEP, format!("removed {removed} line(s)"));

        Ok(())
    }

    fn remove_swap_file(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::RemoveSwapFile;

        if !swap_file.exists() {
            report.record(STEP, "no existing file");
        } else if self.dry_run {
            report.record(STEP, format!("would delete {}", swap_file.display()));
        } else {
            fs::remove_file(swap_file).map_err(|err| SwapError::resource(STEP, err.to_string()))?;
            report.record(STEP, format!("deleted {}", swap_file.display()));
        }

        Ok(())
    }

    fn backup_mount_table(&self, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::BackupMountTable;

        let backup = self.mount_table.backup_path().display();
        if self.mount_table.has_backup() {
            report.record(STEP, format!("backup already exists at {backup}"));
        } else if self.dry_run {
            report.record(STEP, format!("would back up to {backup}"));
        } else {
            self.mount_table
                .ensure_backup()
                .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
            report.record(STEP, format!("backed up to {backup}"));
        }

        Ok(())
    }

    fn disable_other_swaps(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::DisableOtherSwaps;

        let (disabled, skipped) = if self.dry_run {
            let content = self.mount_table.read().map_err(|err| read_error(STEP, err))?;
            let result = crate::fstab::disable_other_swaps(&content, swap_file);
            let skipped = result
                .skipped
                .into_iter()
                .map(|(line_no, line)| SwapError::State { line_no, line })
                .collect();
            (result.disabled, skipped)
        } else {
            self.mount_table
                .disable_other_swaps(swap_file)
                .map_err(|err| SwapError::resource(STEP, err.to_string()))?
        };

        for warning in &skipped {
            warn!("{warning}");
        }
        report.warnings.extend(skipped);

        let verb = if self.dry_run { "would comment out" } else { "commented out" };
        report.record(STEP, format!("{verb} {disabled} other swap entr(ies)"));

        Ok(())
    }

    fn allocate(&self, swap_file: &Path, target_mb: u64, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::Allocate;

        if self.dry_run {
            report.record(STEP, format!("would allocate {target_mb} MiB"));
            return Ok(());
        }

        let expected = mb_to_bytes(target_mb);
        let method = match self.backend.fast_allocate(swap_file, expected) {
            Ok(()) => AllocationMethod::Fast,
            Err(err) => {
                warn!("Fast allocation failed ({err}), falling back to zero-filling");
                remove_if_present(swap_file).map_err(|err| SwapError::resource(STEP, err.to_string()))?;
                self.backend
                    .zero_fill(swap_file, target_mb)
                    .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
                AllocationMethod::ZeroFill
            }
        };

        let actual = fs::metadata(swap_file)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?
            .len();
        if actual != expected {
            return Err(SwapError::resource(
                STEP,
                format!("expected {expected} bytes but the file has {actual}"),
            ));
        }

        let how = match method {
            AllocationMethod::Fast => "fallocate",
            AllocationMethod::ZeroFill => "zero-fill",
        };
        report.record(STEP, format!("allocated {target_mb} MiB with {how}"));

        Ok(())
    }

    fn restrict_permissions(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::RestrictPermissions;

        if self.dry_run {
            report.record(STEP, "would chmod 600");
            return Ok(());
        }

        fs::set_permissions(swap_file, fs::Permissions::from_mode(0o600))
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
        report.record(STEP, "chmod 600");

        Ok(())
    }

    fn activate(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::Activate;

        if self.dry_run {
            report.record(STEP, "would run mkswap and swapon");
            return Ok(());
        }

        self.backend
            .mkswap(swap_file)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
        self.backend
            .swapon(swap_file)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
        report.record(STEP, format!("activated {}", swap_file.display()));

        Ok(())
    }

    fn add_mount_entry(&self, swap_file: &Path, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::AddMountEntry;

        if self.dry_run {
            report.record(STEP, format!("would add '{}'", crate::fstab::own_entry(swap_file)));
            return Ok(());
        }

        let added = self
            .mount_table
            .ensure_own_entry(swap_file)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;
        if added {
            report.record(STEP, format!("added '{}'", crate::fstab::own_entry(swap_file)));
        } else {
            report.record(STEP, "entry already present");
        }

        Ok(())
    }

    fn tune_swappiness(&self, report: &mut ReconcileReport) -> SwapResult<()> {
        const STEP: ReconcileStep = ReconcileStep::TuneSwappiness;

        let value = self.swappiness.to_string();
        if self.dry_run {
            report.record(STEP, format!("would set {SWAPPINESS_KEY}={value}"));
            return Ok(());
        }

        let changed = self
            .sysctl
            .set(SWAPPINESS_KEY, &value)
            .map_err(|err| SwapError::resource(STEP, err.to_string()))?;

        // The persisted value is what matters; the live one is applied on a best
        // effort basis and picked up at the next boot regardless.
        if let Err(err) = self.backend.apply_sysctl(SWAPPINESS_KEY, &value) {
            warn!("Unable to apply {SWAPPINESS_KEY}={value} to the running system: {err}");
        }

        let detail = if changed {
            format!("set {SWAPPINESS_KEY}={value} in {}", self.sysctl.path().display())
        } else {
            format!("{SWAPPINESS_KEY}={value} already set")
        };
        report.record(STEP, detail);

        Ok(())
    }

    /// Undoes a half-prepared swap file. Failures here are only logged, since
    /// the error that led here is the one worth reporting.
    fn discard_swap_file(&self, swap_file: &Path) {
        let is_active = self
            .backend
            .active_swaps()
            .map(|areas| areas.iter().any(|area| area.is_backed_by(swap_file)))
            .unwrap_or(false);

        if is_active {
            if let Err(err) = self.backend.swapoff(swap_file) {
                warn!("Unable to deactivate {} after a failure: {err}", swap_file.display());
            }
        }

        match remove_if_present(swap_file) {
            Ok(true) => info!("Removed the partially prepared {}", swap_file.display()),
            Ok(false) => {}
            Err(err) => warn!("Unable to remove {} after a failure: {err}", swap_file.display()),
        }
    }
}

fn read_error(step: ReconcileStep, err: io::Error) -> SwapError {
    SwapError::resource(step, format!("unable to read the mount table: {err}"))
}

/// Removes `path`, returning whether there was anything to remove.
fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
