use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::constants::MEBIBYTE;

/// Converts bytes to whole MiB, rounding down like `free -m` does.
#[inline]
pub const fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / MEBIBYTE
}

/// Converts an active swap size to MiB, rounding to the nearest MiB. The
/// kernel leaves the header page out of a swap area's size, so rounding down
/// would report a freshly activated 2048 MiB file as 2047 MiB.
#[inline]
pub const fn swap_bytes_to_mb(bytes: u64) -> u64 {
    bytes.saturating_add(MEBIBYTE / 2) / MEBIBYTE
}

/// Converts MiB to bytes, saturating instead of overflowing.
#[inline]
pub const fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(MEBIBYTE)
}

/// Replaces the contents of `path` through a temporary file and a rename, so
/// an interrupted write never leaves a truncated file behind. The permissions
/// of an existing file are kept.
pub fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".swapplan.tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents)?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(&tmp_path, metadata.permissions())?;
    }
    fs::rename(&tmp_path, path)
}

/// Whether the current process runs with an effective uid of 0.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
