use indoc::indoc;

// Default locations on the host.
pub const DEFAULT_SWAP_FILE: &str = "/swapfile";
pub const DEFAULT_FSTAB: &str = "/etc/fstab";
/// Appended to the mount table path to name its backup.
pub const FSTAB_BACKUP_SUFFIX: &str = ".swapplan.bak";
pub const DEFAULT_SYSCTL_CONF: &str = "/etc/sysctl.conf";
pub const DEFAULT_LOCK_FILE: &str = "/run/swapplan.lock";

// Config file, relative to the user's config directory.
pub const DEFAULT_CONFIG_FILE_LOCATION: &str = "swapplan/swapplan.toml";

// Swap sizing.
pub const MIN_SWAP_SIZE_MB: u64 = 128;
pub const MIN_DISK_RESERVE_MB: u64 = 256;
pub const DISK_RESERVE_PERCENT: u64 = 5;

// Kernel tuning.
pub const SWAPPINESS_KEY: &str = "vm.swappiness";
pub const DEFAULT_SWAPPINESS: u8 = 10;

pub const MEBIBYTE: u64 = 1024 * 1024;

/// The default config file, written out if none exists yet. Every value is
/// commented out so the built-in defaults apply.
pub const CONFIG_TEXT: &str = indoc! {r#"
    # This is a default config file for swapplan. All of the settings are commented
    # out by default; if you wish to change them uncomment and modify as you see fit.

    # These options configure the swap file itself.
    [swap]
    # Where the swap file lives. Must be an absolute path without whitespace.
    #file = "/swapfile"
    # The vm.swappiness value written to the sysctl config, from 0 to 100.
    #swappiness = 10
    # The smallest swap size accepted, in MiB. Cannot go below 128.
    #min_size_mb = 128

    # These options point at the system files that get modified.
    [paths]
    #fstab = "/etc/fstab"
    # Taken once, before swapplan first modifies the mount table.
    #fstab_backup = "/etc/fstab.swapplan.bak"
    #sysctl_conf = "/etc/sysctl.conf"
    #lock_file = "/run/swapplan.lock"

    # General behaviour.
    [general]
    # Append a log of every run to this file.
    #log_file = "/var/log/swapplan.log"
    # Report what would be done without changing anything.
    #dry_run = false
"#};
