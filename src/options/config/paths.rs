use serde::Deserialize;

/// Locations of the system files swapplan reads and modifies.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PathsConfig {
    pub(crate) fstab: Option<String>,
    pub(crate) fstab_backup: Option<String>,
    pub(crate) sysctl_conf: Option<String>,
    pub(crate) lock_file: Option<String>,
}
