//! Active swap areas, as listed by the kernel in `/proc/swaps`.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::bail;

const PROC_SWAPS: &str = "/proc/swaps";

/// A single active swap area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapArea {
    pub path: PathBuf,
    pub kind: String,
    pub size_kb: u64,
    pub used_kb: u64,
}

impl SwapArea {
    /// Whether this area is backed by `path`.
    pub fn is_backed_by(&self, path: &Path) -> bool {
        self.path == path
    }
}

/// Undoes the octal escaping the kernel applies to whitespace and
/// backslashes in paths.
fn unescape_path(s: &str) -> String {
    const ESCAPED_BACKSLASH: &str = "\\134";
    const ESCAPED_SPACE: &str = "\\040";
    const ESCAPED_TAB: &str = "\\011";
    const ESCAPED_NEWLINE: &str = "\\012";

    s.replace(ESCAPED_SPACE, " ")
        .replace(ESCAPED_TAB, "\t")
        .replace(ESCAPED_NEWLINE, "\n")
        .replace(ESCAPED_BACKSLASH, "\\")
}

impl FromStr for SwapArea {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<SwapArea> {
        // Example: `/swapfile                               file		2097148		0		-2`
        let mut parts = line.split_whitespace();

        let path = match parts.next() {
            Some(path) => PathBuf::from(unescape_path(path)),
            None => bail!("missing filename"),
        };
        let kind = match parts.next() {
            Some(kind) => kind.to_string(),
            None => bail!("missing type"),
        };
        let size_kb = match parts.next() {
            Some(size) => size.parse()?,
            None => bail!("missing size"),
        };
        let used_kb = match parts.next() {
            Some(used) => used.parse()?,
            None => bail!("missing used"),
        };

        Ok(SwapArea {
            path,
            kind,
            size_kb,
            used_kb,
        })
    }
}

/// Parses the contents of `/proc/swaps`. The header line and anything that
/// does not parse are skipped.
pub fn parse_swap_areas(contents: &str) -> Vec<SwapArea> {
    contents
        .lines()
        .filter(|line| !line.starts_with("Filename"))
        .filter_map(|line| SwapArea::from_str(line).ok())
        .collect()
}

/// Returns the currently active swap areas.
pub fn active_swap_areas() -> io::Result<Vec<SwapArea>> {
    let mut results = vec![];
    let mut reader = BufReader::new(File::open(PROC_SWAPS)?);
    let mut line = String::new();

    while reader.read_line(&mut line)? > 0 {
        if !line.starts_with("Filename") {
            if let Ok(area) = SwapArea::from_str(&line) {
                results.push(area);
            }
        }

        line.clear();
    }

    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "Filename\t\t\t\tType\t\tSize\t\tUsed\t\tPriority\n\
                          /swapfile                               file\t\t2097148\t\t1024\t\t-2\n\
                          /dev/vda3                               partition\t1048572\t\t0\t\t-3\n";

    #[test]
    fn parses_proc_swaps() {
        let areas = parse_swap_areas(SAMPLE);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].path, PathBuf::from("/swapfile"));
        assert_eq!(areas[0].kind, "file");
        assert_eq!(areas[0].size_kb, 2_097_148);
        assert_eq!(areas[0].used_kb, 1024);
        assert_eq!(areas[1].kind, "partition");
        assert!(areas[0].is_backed_by(Path::new("/swapfile")));
        assert!(!areas[1].is_backed_by(Path::new("/swapfile")));
    }

    #[test]
    fn empty_proc_swaps() {
        assert!(parse_swap_areas("Filename\tType\tSize\tUsed\tPriority\n").is_empty());
    }

    #[test]
    fn escaped_paths() {
        let area: SwapArea = "/mnt/my\\040swap file 1024 0 -2".parse().unwrap();
        assert_eq!(area.path, PathBuf::from("/mnt/my swap"));
    }

    #[test]
    fn bad_lines_are_skipped() {
        assert!(SwapArea::from_str("/swapfile file notanumber 0 -2").is_err());
        assert!(SwapArea::from_str("/swapfile").is_err());
        assert_eq!(parse_swap_areas("garbage\n/swapfile file 4 0 -2\n").len(), 1);
    }
}
