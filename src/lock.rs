//! An exclusive advisory lock held for the duration of a run, so two runs
//! never read-modify-write the mount table at the same time.

use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use log::debug;

use crate::utils::error::{SwapError, SwapResult};

/// Holds the run lock until dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        fn try_lock(file: &File) -> io::Result<()> {
            rustix::fs::flock(file, rustix::fs::FlockOperation::NonBlockingLockExclusive)?;
            Ok(())
        }

        fn unlock(file: &File) -> io::Result<()> {
            rustix::fs::flock(file, rustix::fs::FlockOperation::Unlock)?;
            Ok(())
        }
    } else {
        use std::os::fd::AsRawFd;

        fn try_lock(file: &File) -> io::Result<()> {
            // SAFETY: The descriptor stays valid for as long as `file` is borrowed.
            let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if result == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }

        fn unlock(file: &File) -> io::Result<()> {
            // SAFETY: The descriptor stays valid for as long as `file` is borrowed.
            let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
            if result == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
        }
    }
}

impl RunLock {
    /// Takes the lock at `path`, creating the lock file if needed. Fails
    /// immediately if another process holds it.
    pub fn acquire(path: &Path) -> SwapResult<RunLock> {
        let lock_error = |reason: String| SwapError::Lock {
            path: path.to_path_buf(),
            reason: reason.into(),
        };

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(path)
            .map_err(|err| lock_error(err.to_string()))?;

        match try_lock(&file) {
            Ok(()) => {
                debug!("Took the run lock at {}", path.display());
                Ok(RunLock {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Err(lock_error(
                "another swapplan run holds the lock".to_string(),
            )),
            Err(err) => Err(lock_error(err.to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well; this just makes it prompt.
        if unlock(&self.file).is_ok() {
            debug!("Released the run lock at {}", self.path.display());
        }
    }
}
