//! Lexical path utilities.
//!
//! Cached results are matched against scan roots by path prefix, so both
//! sides have to be spelled the same way. Nothing here touches the
//! filesystem: symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path lexically.
///
/// Removes `.` components and repeated separators, and resolves `..` against
/// the preceding component. A `..` directly under the root is dropped; a
/// leading `..` on a relative path is kept. An empty result becomes `.`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use backcheck_storage::normalize_path;
///
/// assert_eq!(normalize_path("/data//photos/./2024/"), Path::new("/data/photos/2024"));
/// assert_eq!(normalize_path("/data/photos/../music"), Path::new("/data/music"));
/// assert_eq!(normalize_path("/../data"), Path::new("/data"));
/// assert_eq!(normalize_path("../data/./x/.."), Path::new("../data"));
/// assert_eq!(normalize_path("a/.."), Path::new("."));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                Some(Component::ParentDir | Component::CurDir) | None => components.push(component),
            },
            other => components.push(other),
        }
    }
    match components.is_empty() {
        true => PathBuf::from("."),
        false => components.into_iter().collect(),
    }
}

/// Whether `path` is `root` itself or lies underneath it, comparing whole
/// components after normalizing both sides.
///
/// ```
/// use backcheck_storage::is_within;
///
/// assert!(is_within("/data/a/b/c/file.txt", "/data/a/b"));
/// assert!(!is_within("/data/a/bc/file.txt", "/data/a/b"));
/// ```
pub fn is_within(path: impl AsRef<Path>, root: impl AsRef<Path>) -> bool {
    normalize(path).starts_with(normalize(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/data/a.txt", "/data/a.txt")]
    #[case("/data//a//b", "/data/a/b")]
    #[case("/data/./a/./b", "/data/a/b")]
    #[case("/data/a/b/", "/data/a/b")]
    #[case("/data/a/b/..", "/data/a")]
    #[case("/data/a/../../..", "/")]
    #[case("relative/./path", "relative/path")]
    #[case("../../up", "../../up")]
    #[case(".", ".")]
    #[case("", ".")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), Path::new(expected));
    }

    #[rstest]
    #[case("/data/a/b/c/x.txt", "/data/a/b/c", true)]
    #[case("/data/a/b/c", "/data/a/b/c", true)]
    #[case("/data/a/b/c/../d/x.txt", "/data/a/b/d", true)]
    #[case("/data/a/b/cd/x.txt", "/data/a/b/c", false)]
    #[case("/data/a/x.txt", "/data/a/b/c", false)]
    #[case("/data/a/b/c/x.txt", "/data/a/b/c/", true)]
    fn test_is_within(#[case] path: &str, #[case] root: &str, #[case] expected: bool) {
        assert_eq!(is_within(path, root), expected);
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_normalization() {
        assert_eq!(normalize(Path::new("C:\\data\\..\\music")), Path::new("C:\\music"));
    }
}
