use std::{ffi::OsString, fs, path::Path, process::Command};

use tempfile::TempDir;

const SWAPPLAN_EXE_PATH: &str = env!("CARGO_BIN_EXE_swapplan");
const DEFAULT_CFG: [&str; 2] = ["-C", "./tests/valid_configs/empty_config.toml"];

pub fn abs_path(path: &str) -> OsString {
    let path = Path::new(path);

    if path.exists() {
        path.canonicalize().unwrap().into_os_string()
    } else {
        // We are going to trust that the path given is valid...
        path.to_owned().into_os_string()
    }
}

/// Returns the [`Command`] of a binary invocation of swapplan.
pub fn swapplan_command(args: &[&str]) -> Command {
    let mut cmd = Command::new(SWAPPLAN_EXE_PATH);

    let mut prev = "";
    for arg in args.iter() {
        if prev == "-C" {
            // This is the config file; make sure we set it to absolute path!
            cmd.arg(abs_path(arg));
        } else {
            cmd.arg(arg);
        }

        prev = arg;
    }

    cmd
}

/// Returns the [`Command`] of a binary invocation of swapplan with the
/// default, empty config file.
pub fn no_cfg_swapplan_command() -> Command {
    swapplan_command(&DEFAULT_CFG)
}

/// A scratch set of system files, so runs never touch the real ones.
pub struct ScratchHost {
    pub dir: TempDir,
}

pub const FSTAB: &str = "UUID=1234 / ext4 errors=remount-ro 0 1\n/dev/vda2 none swap sw 0 0\n";

impl ScratchHost {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fstab"), FSTAB).unwrap();

        ScratchHost { dir }
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    /// Path arguments pointing every system file into the scratch directory.
    pub fn args(&self) -> Vec<String> {
        [
            ("--swap-file", "swapfile"),
            ("--fstab", "fstab"),
            ("--sysctl-conf", "sysctl.conf"),
            ("--lock-file", "swapplan.lock"),
        ]
        .into_iter()
        .flat_map(|(arg, name)| [arg.to_string(), self.path(name)])
        .collect()
    }
}
