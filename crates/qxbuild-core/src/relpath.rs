//! Separator-explicit path relativization.
//!
//! Generated configuration files reference build directories relative to the
//! application target. The separator baked into the output is chosen by the
//! caller, never taken from the host, so a config emitted on Windows resolves
//! the same way when read on Unix (and vice versa).

use std::path::Path;

use crate::error::{BuildError, BuildResult};

/// Compute `target` relative to `base`, using exactly `separator` in the output.
///
/// `base_is_file` decides whether the last base segment is a directory to
/// climb out of. When `None`, an existing base is probed on disk; otherwise a
/// trailing separator in the raw `base` string marks a directory and anything
/// else is assumed to be a file.
///
/// Fails with [`BuildError::PathResolution`] when the two paths share no
/// leading segment (e.g. different drive letters).
pub fn relativize(
    target: &str,
    base: &str,
    separator: char,
    base_is_file: Option<bool>,
) -> BuildResult<String> {
    check_separator(separator, base)?;

    let norm_target = normalize(target, separator).ok_or_else(|| {
        resolution_error(target, base, "path climbs above its root")
    })?;
    let norm_base = normalize(base, separator).ok_or_else(|| {
        resolution_error(target, base, "path climbs above its root")
    })?;

    let target_segs = segments(&norm_target, separator);
    let base_segs = segments(&norm_base, separator);

    let common = target_segs
        .iter()
        .zip(base_segs.iter())
        .take_while(|(t, b)| t == b)
        .count();
    if common == 0 {
        return Err(resolution_error(
            &norm_target,
            &norm_base,
            "no common path element",
        ));
    }

    let base_is_file = base_is_file.unwrap_or_else(|| match std::fs::metadata(&norm_base) {
        Ok(meta) => meta.is_file(),
        Err(_) => !base.ends_with(separator),
    });

    // A file's own name is not a directory to climb out of. When the whole
    // base is a prefix of the target there is nothing to climb at all.
    let remaining = base_segs.len() - common;
    let climb = if base_is_file {
        remaining.saturating_sub(1)
    } else {
        remaining
    };

    let parts: Vec<&str> = std::iter::repeat("..")
        .take(climb)
        .chain(target_segs[common..].iter().copied())
        .collect();
    let sep = separator.to_string();
    let relative = parts.join(&sep);
    Ok(relative.trim_end_matches(separator).to_string())
}

/// Resolve `relative` against the directory `base_dir` and normalize the result.
///
/// Inverse of [`relativize`] for a directory base.
pub fn resolve_relative(base_dir: &str, relative: &str, separator: char) -> BuildResult<String> {
    check_separator(separator, base_dir)?;
    let joined = if relative.is_empty() {
        base_dir.to_string()
    } else {
        format!("{}{}{}", base_dir, separator, relative)
    };
    normalize(&joined, separator)
        .ok_or_else(|| resolution_error(relative, base_dir, "path climbs above its root"))
}

/// Normalize `path` to use only `separator`, collapsing empty and `.`
/// segments and folding `..` into its parent. No trailing separator is kept.
///
/// Returns `None` when an absolute path would climb above its root.
pub fn normalize(path: &str, separator: char) -> Option<String> {
    let unified: String = path
        .chars()
        .map(|c| if c == '/' || c == '\\' { separator } else { c })
        .collect();
    let (prefix, rest) = split_prefix(&unified, separator);

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split(separator) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if prefix.is_empty() => parts.push(".."),
                _ => return None,
            },
            other => parts.push(other),
        }
    }

    let mut out = String::with_capacity(unified.len());
    out.push_str(prefix);
    out.push_str(&parts.join(&separator.to_string()));
    Some(out)
}

/// Split off a root prefix: `X:` plus an optional separator, or a leading separator.
fn split_prefix(path: &str, separator: char) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if path[2..].starts_with(separator) {
            (&path[..3], &path[3..])
        } else {
            (&path[..2], &path[2..])
        }
    } else if path.starts_with(separator) {
        (&path[..1], path.trim_start_matches(separator))
    } else {
        ("", path)
    }
}

/// Segments of a normalized path. An absolute Unix path starts with an empty
/// segment (the root), a drive path with `X:`.
fn segments(path: &str, separator: char) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut segs: Vec<&str> = path.split(separator).collect();
    while segs.len() > 1 && segs.last() == Some(&"") {
        segs.pop();
    }
    segs
}

fn check_separator(separator: char, context: &str) -> BuildResult<()> {
    if separator == '/' || separator == '\\' {
        Ok(())
    } else {
        Err(BuildError::configuration(
            Path::new(context),
            format!("unrecognised directory separator '{}'", separator),
        ))
    }
}

fn resolution_error(target: &str, base: &str, message: &str) -> BuildError {
    BuildError::PathResolution {
        target: target.to_string(),
        base: base.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_of_directory_base() {
        assert_eq!(relativize("/a/b/c", "/a/b", '/', Some(false)).unwrap(), "c");
    }

    #[test]
    fn test_sibling_directories() {
        assert_eq!(
            relativize("/a/x/y", "/a/b/c", '/', Some(false)).unwrap(),
            "../../x/y"
        );
    }

    #[test]
    fn test_file_base_climbs_from_parent() {
        assert_eq!(
            relativize("/a/x", "/a/b/f.txt", '/', Some(true)).unwrap(),
            "../x"
        );
    }

    #[test]
    fn test_ancestor_target() {
        assert_eq!(
            relativize("/a", "/a/b/c", '/', Some(false)).unwrap(),
            "../.."
        );
    }

    #[test]
    fn test_identical_paths_yield_empty() {
        assert_eq!(relativize("/p/q", "/p/q", '/', Some(false)).unwrap(), "");
        assert_eq!(relativize("/p/q/", "/p/q", '/', Some(false)).unwrap(), "");
        assert_eq!(relativize("C:\\p", "C:\\p", '\\', Some(false)).unwrap(), "");
    }

    #[test]
    fn test_backslash_separator_on_any_host() {
        assert_eq!(
            relativize("C:\\work\\sdk", "C:\\work\\app\\target", '\\', Some(false)).unwrap(),
            "..\\..\\sdk"
        );
    }

    #[test]
    fn test_separator_is_forced() {
        assert_eq!(
            relativize("C:\\work\\sdk\\tool", "C:/work/app", '/', Some(false)).unwrap(),
            "../sdk/tool"
        );
        assert_eq!(
            relativize("/srv/a/b", "/srv/c", '\\', Some(false)).unwrap(),
            "..\\a\\b"
        );
    }

    #[test]
    fn test_no_common_prefix_fails() {
        let err = relativize("/a/b", "D:\\c", '/', Some(false)).unwrap_err();
        assert!(matches!(err, BuildError::PathResolution { .. }));

        let err = relativize("C:\\a", "D:\\a", '\\', Some(false)).unwrap_err();
        assert!(matches!(err, BuildError::PathResolution { .. }));
    }

    #[test]
    fn test_relative_vs_absolute_has_no_common_prefix() {
        assert!(relativize("a/b", "/a/b", '/', Some(false)).is_err());
    }

    #[test]
    fn test_normalization_collapses_dots_and_doubles() {
        assert_eq!(
            relativize("/a/./b//c/../d", "/a", '/', Some(false)).unwrap(),
            "b/d"
        );
        assert_eq!(normalize("/a//b/./c/", '/').as_deref(), Some("/a/b/c"));
        assert_eq!(normalize("a/../../b", '/').as_deref(), Some("../b"));
        assert_eq!(normalize("/", '/').as_deref(), Some("/"));
    }

    #[test]
    fn test_climbing_above_root_fails() {
        assert_eq!(normalize("/../x", '/'), None);
        let err = relativize("/../x", "/a", '/', Some(false)).unwrap_err();
        assert!(matches!(err, BuildError::PathResolution { .. }));
    }

    #[test]
    fn test_unrecognised_separator() {
        let err = relativize("/a", "/b", ':', Some(false)).unwrap_err();
        assert!(matches!(err, BuildError::Configuration { .. }));
    }

    #[test]
    fn test_base_kind_autodetect() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_string_lossy().replace('\\', "/");
        let existing_dir = format!("{}/dir", root);
        std::fs::create_dir_all(&existing_dir).unwrap();
        let existing_file = format!("{}/dir/file.txt", root);
        std::fs::write(&existing_file, "x").unwrap();
        let target = format!("{}/other/x", root);

        // existing directory: climb out of it
        assert_eq!(
            relativize(&target, &existing_dir, '/', None).unwrap(),
            "../other/x"
        );
        // existing file: climb starts from its parent
        assert_eq!(
            relativize(&target, &existing_file, '/', None).unwrap(),
            "../other/x"
        );
        // missing path with trailing separator: directory
        let missing_dir = format!("{}/missing/", root);
        assert_eq!(
            relativize(&target, &missing_dir, '/', None).unwrap(),
            "../other/x"
        );
        // missing path without trailing separator: file
        let missing_file = format!("{}/missing", root);
        assert_eq!(
            relativize(&target, &missing_file, '/', None).unwrap(),
            "other/x"
        );
    }

    #[test]
    fn test_file_base_that_is_prefix_of_target_does_not_underflow() {
        // base fully shared with target and flagged as a file: the climb
        // count would be -1, clamped to zero.
        assert_eq!(relativize("/a/b/c", "/a/b", '/', Some(true)).unwrap(), "c");
        assert_eq!(relativize("/a/b", "/a/b", '/', Some(true)).unwrap(), "");
    }

    #[test]
    fn test_relativize_then_resolve_round_trips() {
        let cases = [
            ("/proj/target/qooxdoo/app", "/proj/src/main/qooxdoo/classes"),
            ("/proj/target/qooxdoo/app", "/proj/target/qooxdoo/app/cache"),
            ("/proj/target/qooxdoo/app", "/proj"),
            ("/proj/a/b/c", "/proj/x/y/z"),
            ("/proj", "/proj"),
            ("/", "/usr/lib"),
        ];
        for (base, target) in cases {
            let rel = relativize(target, base, '/', Some(false)).unwrap();
            let back = resolve_relative(base, &rel, '/').unwrap();
            assert_eq!(
                back,
                normalize(target, '/').unwrap(),
                "base={} target={} rel={}",
                base,
                target,
                rel
            );
        }

        let rel = relativize("D:\\w\\sdk", "D:\\w\\app\\t", '\\', Some(false)).unwrap();
        assert_eq!(resolve_relative("D:\\w\\app\\t", &rel, '\\').unwrap(), "D:\\w\\sdk");
    }
}
