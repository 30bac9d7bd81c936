//! Persistent kernel tuning parameters, as `key=value` lines in a sysctl
//! config file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;

use crate::utils::general::replace_file;

/// Returns the key of a `key = value` line, ignoring comments.
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return None;
    }

    trimmed.split_once('=').map(|(key, _)| key.trim())
}

fn line_value(line: &str) -> Option<&str> {
    line.split_once('=').map(|(_, value)| value.trim())
}

/// Returns the value `key` is set to, if any. The last assignment wins, the
/// same way sysctl applies the file.
pub fn current_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .filter(|line| line_key(line) == Some(key))
        .filter_map(line_value)
        .last()
}

/// Makes sure `key` is set to `value` exactly once.
///
/// The first assignment is updated in place if it has a different value and
/// any later assignments are dropped. If there is none, one is appended.
/// Returns the new content and whether it changed.
pub fn set_param(content: &str, key: &str, value: &str) -> (String, bool) {
    let wanted = format!("{key}={value}");
    let mut seen = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line_key(line) == Some(key) {
            if !seen {
                seen = true;
                if line_value(line) == Some(value) {
                    lines.push(line);
                } else {
                    lines.push(&wanted);
                }
            }
        } else {
            lines.push(line);
        }
    }

    if !seen {
        lines.push(&wanted);
    }

    let mut updated = lines.join("\n");
    updated.push('\n');

    let changed = updated != content;
    (updated, changed)
}

/// A sysctl config file, such as `/etc/sysctl.conf`.
#[derive(Debug, Clone)]
pub struct SysctlConf {
    path: PathBuf,
}

impl SysctlConf {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. A missing file reads as empty.
    pub fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    pub fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(current_value(&self.read()?, key).map(str::to_string))
    }

    /// Sets `key` to `value`, writing only if something changed. Returns
    /// whether the file was written.
    pub fn set(&self, key: &str, value: &str) -> io::Result<bool> {
        let original = self.read()?;
        let (updated, changed) = set_param(&original, key, value);

        if changed {
            replace_file(&self.path, &updated)?;
            debug!("Set {key}={value} in {}", self.path.display());
        }

        Ok(changed)
    }
}
