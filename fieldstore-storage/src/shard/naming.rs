//! Directory naming for the shard tree.
//!
//! Names are zero-padded decimals whose width is `floor(log10(fanout))`.
//! With a fanout of 1000 the children of a directory are `000` through
//! `999`; numbers wider than the pad width are written in full. This is the
//! on-disk format and existing trees depend on it.

use std::fs;
use std::path::{Path, PathBuf};

use fieldstore_core::ShardError;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("Invalid directory name regex"));

/// Pad width for a given fanout.
pub fn name_width(fanout: u32) -> usize {
    let mut width = 0;
    let mut n = fanout / 10;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}

/// Directory name for `number` under a parent of the given fanout.
pub fn directory_name(number: u64, fanout: u32) -> String {
    format!("{:0width$}", number, width = name_width(fanout))
}

/// True if `name` is a shard directory name.
pub fn is_numeric_name(name: &str) -> bool {
    NUMERIC_NAME.is_match(name)
}

/// Parse a shard directory name, ignoring leading zeros. All zeros is 0.
pub fn parse_directory_number(name: &str) -> Option<u64> {
    if !is_numeric_name(name) {
        return None;
    }
    let trimmed = name.trim_start_matches('0');
    if trimmed.is_empty() {
        Some(0)
    } else {
        trimmed.parse().ok()
    }
}

/// Numerically named children of `dir`, sorted by number. A numeric name
/// too large to represent is an integrity violation rather than skipped.
pub(crate) fn numeric_children(dir: &Path) -> Result<Vec<(u64, PathBuf)>, ShardError> {
    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str().filter(|n| is_numeric_name(n)) else {
            continue;
        };
        let number = parse_directory_number(name).ok_or_else(|| ShardError::IntegrityViolation {
            path: entry.path(),
            reason: "directory number out of range".to_string(),
        })?;
        children.push((number, entry.path()));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(children)
}

/// Number of entries of any kind in `dir`.
pub(crate) fn entry_count(dir: &Path) -> Result<usize, ShardError> {
    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    let mut count = 0;
    for entry in entries {
        entry.map_err(|e| io_error(dir, e))?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn io_error(path: &Path, e: std::io::Error) -> ShardError {
    ShardError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_width_is_floor_log10() {
        assert_eq!(name_width(1), 0);
        assert_eq!(name_width(2), 0);
        assert_eq!(name_width(9), 0);
        assert_eq!(name_width(10), 1);
        assert_eq!(name_width(99), 1);
        assert_eq!(name_width(100), 2);
        assert_eq!(name_width(1000), 3);
    }

    #[test]
    fn test_directory_name_padding() {
        assert_eq!(directory_name(0, 1000), "000");
        assert_eq!(directory_name(7, 1000), "007");
        assert_eq!(directory_name(999, 1000), "999");
        assert_eq!(directory_name(1000, 1000), "1000");
        assert_eq!(directory_name(3, 2), "3");
        assert_eq!(directory_name(3, 10), "3");
    }

    #[test]
    fn test_parse_strips_leading_zeros() {
        assert_eq!(parse_directory_number("007"), Some(7));
        assert_eq!(parse_directory_number("000"), Some(0));
        assert_eq!(parse_directory_number("0"), Some(0));
        assert_eq!(parse_directory_number("120"), Some(120));
        assert_eq!(parse_directory_number("12a"), None);
        assert_eq!(parse_directory_number(""), None);
        assert_eq!(parse_directory_number("-1"), None);
    }

    #[test]
    fn test_numeric_children_ignores_other_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["002", "010", "001", "lost+found", ".hidden"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let numbers: Vec<u64> = numeric_children(dir.path())
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(entry_count(dir.path()).unwrap(), 6);
    }

    #[test]
    fn test_out_of_range_name_is_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("001")).unwrap();
        fs::create_dir(dir.path().join("18446744073709551616")).unwrap();

        assert_eq!(parse_directory_number("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_directory_number("18446744073709551616"), None);
        assert!(matches!(
            numeric_children(dir.path()),
            Err(ShardError::IntegrityViolation { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn prop_name_parses_back(number in 0u64..1_000_000, fanout in 1u32..100_000) {
            let name = directory_name(number, fanout);
            prop_assert!(name.len() >= name_width(fanout));
            prop_assert_eq!(parse_directory_number(&name), Some(number));
        }

        #[test]
        fn prop_names_below_fanout_have_equal_width(a in 0u64..1000, b in 0u64..1000) {
            let fanout = 1000;
            prop_assert_eq!(directory_name(a, fanout).len(), directory_name(b, fanout).len());
        }
    }
}
