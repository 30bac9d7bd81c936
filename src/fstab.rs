//! The static mount table and the swap entries in it.
//!
//! The table moves through [`FstabState`] in order. Every transition is
//! idempotent, so running the whole sequence again leaves the table as it is.

use std::{
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::{debug, info};
use regex::Regex;

use crate::utils::{error::SwapError, general::replace_file};

/// Where the mount table is in its lifecycle, from swapplan's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FstabState {
    /// swapplan has never modified the table, so there is no backup.
    Unmodified,
    /// A backup exists, but other active swap entries remain.
    BackedUp,
    /// No other active swap entries remain, but the swap file has no entry.
    OtherEntriesDisabled,
    /// The swap file has its entry and nothing else competes with it.
    OwnEntryPresent,
}

impl fmt::Display for FstabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FstabState::Unmodified => write!(f, "unmodified"),
            FstabState::BackedUp => write!(f, "backed up"),
            FstabState::OtherEntriesDisabled => write!(f, "other swap entries disabled"),
            FstabState::OwnEntryPresent => write!(f, "swap file entry present"),
        }
    }
}

/// An active (uncommented) swap entry: device, mount point, then `swap` as the
/// filesystem type.
fn swap_entry_pattern() -> &'static Regex {
    static SWAP_ENTRY: OnceLock<Regex> = OnceLock::new();

    SWAP_ENTRY.get_or_init(|| {
        Regex::new(r"^\s*([^#\s]\S*)\s+\S+\s+swap(\s|$)").expect("the swap entry pattern is valid")
    })
}

/// How a single line of the table is understood.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Blank lines and comments.
    Inert,
    /// An active swap entry and its device.
    Swap(&'a str),
    /// Any other active entry.
    Mount,
    /// An active line that mentions swap but is not a well-formed entry.
    Unparseable,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Inert;
    }

    if let Some(captures) = swap_entry_pattern().captures(line) {
        if let Some(device) = captures.get(1) {
            return Line::Swap(device.as_str());
        }
    }

    // A `swap` type that is not in the third field means a field went missing.
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let misplaced_type = fields.iter().skip(1).take(2).any(|field| *field == "swap");
    if misplaced_type || (fields.len() < 3 && trimmed.contains("swap")) {
        Line::Unparseable
    } else {
        Line::Mount
    }
}

fn is_own_entry(line: &str, swap_file: &Path) -> bool {
    matches!(classify(line), Line::Swap(device) if Path::new(device) == swap_file)
}

/// Joins lines back together, keeping a trailing newline if there is content.
fn join_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        let mut joined = lines.join("\n");
        joined.push('\n');
        joined
    }
}

/// Drops active lines whose device is `swap_file`. Returns the new content
/// and how many lines were removed.
pub fn remove_entries(content: &str, swap_file: &Path) -> (String, usize) {
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| !is_own_entry(line, swap_file))
        .collect();
    let removed = content.lines().count() - kept.len();

    (join_lines(&kept), removed)
}

/// Result of commenting out competing swap entries.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DisabledSwaps {
    pub content: String,
    pub disabled: usize,
    /// Lines left untouched because they could not be safely parsed.
    pub skipped: Vec<(usize, String)>,
}

/// Comments out every active swap entry that is not for `swap_file`, keeping
/// the original text after the `# ` prefix. Already commented entries are left
/// alone.
pub fn disable_other_swaps(content: &str, swap_file: &Path) -> DisabledSwaps {
    let mut result = DisabledSwaps::default();
    let mut lines = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        match classify(line) {
            Line::Swap(device) if Path::new(device) != swap_file => {
                lines.push(format!("# {line}"));
                result.disabled += 1;
            }
            Line::Unparseable => {
                result.skipped.push((idx + 1, line.to_string()));
                lines.push(line.to_string());
            }
            _ => lines.push(line.to_string()),
        }
    }

    let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
    result.content = join_lines(&borrowed);
    result
}

/// The entry swapplan writes for its swap file.
pub fn own_entry(swap_file: &Path) -> String {
    format!("{} none swap sw 0 0", swap_file.display())
}

/// Whether an active entry for `swap_file` exists.
pub fn has_own_entry(content: &str, swap_file: &Path) -> bool {
    content.lines().any(|line| is_own_entry(line, swap_file))
}

/// Whether any active swap entry other than `swap_file`'s exists.
pub fn has_other_swaps(content: &str, swap_file: &Path) -> bool {
    content
        .lines()
        .any(|line| matches!(classify(line), Line::Swap(device) if Path::new(device) != swap_file))
}

/// Appends the entry for `swap_file` unless an active one already exists.
pub fn add_own_entry(content: &str, swap_file: &Path) -> (String, bool) {
    if has_own_entry(content, swap_file) {
        return (content.to_string(), false);
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&own_entry(swap_file));
    updated.push('\n');

    (updated, true)
}

/// The mount table on disk, plus where its one-time backup lives.
#[derive(Debug, Clone)]
pub struct MountTable {
    path: PathBuf,
    backup_path: PathBuf,
}

impl MountTable {
    pub fn new<P: Into<PathBuf>, B: Into<PathBuf>>(path: P, backup_path: B) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Reads the table. A missing table reads as empty.
    pub fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    pub fn has_backup(&self) -> bool {
        self.backup_path.exists()
    }

    /// Copies the table to the backup path if, and only if, no backup exists
    /// yet. Returns whether a backup was written by this call.
    pub fn ensure_backup(&self) -> io::Result<bool> {
        let content = self.read()?;

        let mut backup = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.backup_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(err),
        };

        backup.write_all(content.as_bytes())?;
        backup.sync_all()?;
        info!("Backed up {} to {}", self.path.display(), self.backup_path.display());

        Ok(true)
    }

    /// Writes `updated` if it differs from `original`. The backup is taken
    /// first, so the very first modification still preserves the original.
    fn write_if_changed(&self, original: &str, updated: &str) -> io::Result<bool> {
        if original == updated {
            return Ok(false);
        }

        self.ensure_backup()?;

        replace_file(&self.path, updated)?;
        debug!("Rewrote {}", self.path.display());

        Ok(true)
    }

    /// Removes active entries for `swap_file`. Returns how many were removed.
    pub fn remove_entries_for(&self, swap_file: &Path) -> io::Result<usize> {
        let original = self.read()?;
        let (updated, removed) = remove_entries(&original, swap_file);
        self.write_if_changed(&original, &updated)?;

        Ok(removed)
    }

    /// Comments out competing swap entries. Lines that could not be parsed are
    /// returned as [`SwapError::State`] and left untouched.
    pub fn disable_other_swaps(&self, swap_file: &Path) -> io::Result<(usize, Vec<SwapError>)> {
        let original = self.read()?;
        let result = disable_other_swaps(&original, swap_file);
        self.write_if_changed(&original, &result.content)?;

        let skipped = result
            .skipped
            .into_iter()
            .map(|(line_no, line)| SwapError::State { line_no, line })
            .collect();

        Ok((result.disabled, skipped))
    }

    /// Adds the entry for `swap_file` if it is missing. Returns whether it was
    /// added.
    pub fn ensure_own_entry(&self, swap_file: &Path) -> io::Result<bool> {
        let original = self.read()?;
        let (updated, added) = add_own_entry(&original, swap_file);
        self.write_if_changed(&original, &updated)?;

        Ok(added)
    }

    /// Returns the active swap entries, for reporting.
    pub fn swap_entries(&self) -> io::Result<Vec<String>> {
        Ok(self
            .read()?
            .lines()
            .filter(|line| matches!(classify(line), Line::Swap(_)))
            .map(str::to_string)
            .collect())
    }

    pub fn state(&self, swap_file: &Path) -> io::Result<FstabState> {
        if !self.has_backup() {
            return Ok(FstabState::Unmodified);
        }

        let content = self.read()?;
        let state = if has_other_swaps(&content, swap_file) {
            FstabState::BackedUp
        } else if has_own_entry(&content, swap_file) {
            FstabState::OwnEntryPresent
        } else {
            FstabState::OtherEntriesDisabled
        };

        Ok(state)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SWAP_FILE: &str = "/swapfile";

    const TABLE: &str = "\
# /etc/fstab: static file system information.
UUID=1234 / ext4 errors=remount-ro 0 1
/dev/vda2 none swap sw 0 0
#/dev/vda9 none swap sw 0 0
/swapfile none swap sw 0 0
";

    fn swap_file() -> &'static Path {
        Path::new(SWAP_FILE)
    }

    #[test]
    fn classify_lines() {
        assert_eq!(classify(""), Line::Inert);
        assert_eq!(classify("   # comment"), Line::Inert);
        assert_eq!(classify("/swapfile none swap sw 0 0"), Line::Swap("/swapfile"));
        assert_eq!(classify("\t/dev/vda2\tnone\tswap\tdefaults\t0\t0"), Line::Swap("/dev/vda2"));
        assert_eq!(classify("UUID=1 / ext4 defaults 0 1"), Line::Mount);
        assert_eq!(classify("/data /srv/swapdata ext4 defaults 0 2"), Line::Mount);
        assert_eq!(classify("/swapfile swap"), Line::Unparseable);
        assert_eq!(classify("/dev/sdb swap sw"), Line::Unparseable);
        assert_eq!(classify("/dev/sdb swap sw 0 0"), Line::Unparseable);
        assert_eq!(classify("/dev/sdc /srv/swapdata ext4"), Line::Mount);
        assert_eq!(classify("/srv/swapdata /data ext4 defaults 0 2"), Line::Mount);
    }

    #[test]
    fn removes_only_own_entries() {
        let (updated, removed) = remove_entries(TABLE, swap_file());
        assert_eq!(removed, 1);
        assert!(!updated.contains("\n/swapfile"));
        assert!(updated.contains("/dev/vda2 none swap sw 0 0"));
        assert!(updated.ends_with('\n'));
    }

    #[test]
    fn disables_other_swaps() {
        let result = disable_other_swaps(TABLE, swap_file());
        assert_eq!(result.disabled, 1);
        assert!(result.skipped.is_empty());
        assert!(result.content.contains("# /dev/vda2 none swap sw 0 0"));
        // Already commented entries stay exactly as they were.
        assert!(result.content.contains("\n#/dev/vda9 none swap sw 0 0\n"));
        assert!(result.content.contains("\n/swapfile none swap sw 0 0\n"));

        let again = disable_other_swaps(&result.content, swap_file());
        assert_eq!(again.disabled, 0);
        assert_eq!(again.content, result.content);
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let table = "UUID=1 / ext4 defaults 0 1\n/dev/sdb swap\n";
        let result = disable_other_swaps(table, swap_file());
        assert_eq!(result.disabled, 0);
        assert_eq!(result.skipped, vec![(2, "/dev/sdb swap".to_string())]);
        assert_eq!(result.content, table);
    }

    #[test]
    fn entries_missing_a_mount_point_are_reported() {
        let table = "/dev/sdb swap sw
/data /srv/swapdata ext4 defaults 0 2
";
        let result = disable_other_swaps(table, swap_file());
        assert_eq!(result.disabled, 0);
        assert_eq!(result.skipped, vec![(1, "/dev/sdb swap sw".to_string())]);
        assert_eq!(result.content, table);
    }

    #[test]
    fn adds_own_entry_once() {
        let (updated, added) = add_own_entry("UUID=1 / ext4 defaults 0 1", swap_file());
        assert!(added);
        assert_eq!(updated, "UUID=1 / ext4 defaults 0 1\n/swapfile none swap sw 0 0\n");

        let (again, added) = add_own_entry(&updated, swap_file());
        assert!(!added);
        assert_eq!(again, updated);
    }

    #[test]
    fn commented_own_entry_does_not_count() {
        let (updated, added) = add_own_entry("# /swapfile none swap sw 0 0\n", swap_file());
        assert!(added);
        assert_eq!(updated.matches("\n/swapfile none swap sw 0 0").count(), 1);
    }

    #[test]
    fn backup_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(&fstab, TABLE).unwrap();
        let table = MountTable::new(&fstab, dir.path().join("fstab.bak"));

        assert_eq!(table.state(swap_file()).unwrap(), FstabState::Unmodified);
        assert!(table.ensure_backup().unwrap());
        assert!(!table.ensure_backup().unwrap());

        fs::write(&fstab, "changed\n").unwrap();
        assert!(!table.ensure_backup().unwrap());
        assert_eq!(fs::read_to_string(table.backup_path()).unwrap(), TABLE);
    }

    #[test]
    fn first_write_backs_up_original() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(&fstab, TABLE).unwrap();
        let table = MountTable::new(&fstab, dir.path().join("fstab.bak"));

        assert_eq!(table.remove_entries_for(swap_file()).unwrap(), 1);
        assert_eq!(fs::read_to_string(table.backup_path()).unwrap(), TABLE);
    }

    #[test]
    fn unchanged_table_is_not_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(&fstab, "UUID=1 / ext4 defaults 0 1\n").unwrap();
        let table = MountTable::new(&fstab, dir.path().join("fstab.bak"));

        assert_eq!(table.remove_entries_for(swap_file()).unwrap(), 0);
        assert!(!table.has_backup());
    }

    #[test]
    fn state_machine_converges() {
        let dir = tempfile::tempdir().unwrap();
        let fstab = dir.path().join("fstab");
        fs::write(&fstab, TABLE).unwrap();
        let table = MountTable::new(&fstab, dir.path().join("fstab.bak"));

        let mut finals = Vec::new();
        for _ in 0..3 {
            table.ensure_backup().unwrap();
            assert!(table.state(swap_file()).unwrap() >= FstabState::BackedUp);

            table.remove_entries_for(swap_file()).unwrap();
            let (_, skipped) = table.disable_other_swaps(swap_file()).unwrap();
            assert!(skipped.is_empty());
            assert_eq!(
                table.state(swap_file()).unwrap(),
                FstabState::OtherEntriesDisabled
            );

            table.ensure_own_entry(swap_file()).unwrap();
            assert_eq!(table.state(swap_file()).unwrap(), FstabState::OwnEntryPresent);

            finals.push(table.read().unwrap());
        }

        assert!(finals.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(table.swap_entries().unwrap(), vec![own_entry(swap_file())]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn missing_table_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = MountTable::new(dir.path().join("fstab"), dir.path().join("fstab.bak"));
        assert_eq!(table.read().unwrap(), "");
        assert!(table.ensure_own_entry(swap_file()).unwrap());
        assert_eq!(table.read().unwrap(), "/swapfile none swap sw 0 0\n");
    }
}
