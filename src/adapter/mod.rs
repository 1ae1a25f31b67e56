//! Conversion of analyzer output into [`Warning`]s.
//!
//! - [`sarif`] reads SARIF 2.1.0 reports
//! - [`plain`] reads line-oriented text output
//!
//! Both keep only findings in files under test, described by an
//! [`AdapterContext`].

pub mod plain;
pub mod sarif;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::Result;
use crate::warning::Warning;

pub use plain::PlainWarningAdapter;
pub use sarif::{SarifReport, SarifWarningAdapter};

/// Converts one kind of analyzer report into warnings.
pub trait WarningAdapter {
    /// Report this adapter reads.
    type Report: ?Sized;

    /// Convert a report, keeping only findings in scope.
    fn to_warnings(&self, report: &Self::Report, ctx: &AdapterContext) -> Result<Vec<Warning>>;
}

/// Where tests live and which files are under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterContext {
    /// Absolute root that warning file names are relative to.
    pub test_root: PathBuf,

    /// Absolute paths under test. Empty means every file is in scope.
    pub in_scope: HashSet<PathBuf>,
}

impl AdapterContext {
    /// Create a context. Relative scope paths are taken relative to
    /// `test_root`.
    pub fn new(test_root: impl Into<PathBuf>, in_scope: impl IntoIterator<Item = PathBuf>) -> Self {
        let test_root = normalize(&test_root.into());
        let in_scope = in_scope
            .into_iter()
            .map(|p| normalize(&test_root.join(p)))
            .collect();
        Self {
            test_root,
            in_scope,
        }
    }

    /// Resolve a report URI to an absolute path.
    ///
    /// Accepts `file://` URIs and plain paths; relative paths are joined
    /// to the test root.
    pub fn resolve(&self, uri: &str) -> std::result::Result<PathBuf, String> {
        if uri.trim().is_empty() {
            return Err("empty uri".to_string());
        }
        if uri.starts_with("file:") {
            let url = Url::parse(uri).map_err(|e| format!("invalid file uri: {}", e))?;
            let path = url
                .to_file_path()
                .map_err(|()| "file uri does not denote a local path".to_string())?;
            return Ok(normalize(&path));
        }
        if let Ok(url) = Url::parse(uri) {
            // A one-letter scheme is a Windows drive, not a URI.
            if url.scheme().len() > 1 {
                return Err(format!("unsupported uri scheme `{}`", url.scheme()));
            }
        }
        Ok(normalize(&self.test_root.join(uri)))
    }

    /// Path of `absolute` relative to the test root, if it is in scope.
    pub fn scoped_file_name(&self, absolute: &Path) -> Option<PathBuf> {
        if !self.in_scope.is_empty() && !self.in_scope.contains(absolute) {
            return None;
        }
        Some(
            absolute
                .strip_prefix(&self.test_root)
                .unwrap_or(absolute)
                .to_path_buf(),
        )
    }
}

/// Remove `.` and resolve `..` components without touching the disk.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(scope: &[&str]) -> AdapterContext {
        AdapterContext::new(
            "/workspace/tests",
            scope.iter().map(PathBuf::from).collect::<Vec<_>>(),
        )
    }

    #[test]
    #[cfg(unix)]
    fn relative_and_file_uris_resolve_to_the_same_path() {
        let ctx = ctx(&["suite1/foo.test"]);

        let relative = ctx.resolve("suite1/foo.test").unwrap();
        let absolute = ctx.resolve("file:///workspace/tests/suite1/foo.test").unwrap();

        assert_eq!(relative, absolute);
        assert_eq!(
            ctx.scoped_file_name(&relative),
            Some(PathBuf::from("suite1/foo.test"))
        );
        assert_eq!(ctx.scoped_file_name(&absolute), ctx.scoped_file_name(&relative));
    }

    #[test]
    #[cfg(unix)]
    fn percent_encoded_file_uri_is_decoded() {
        let ctx = ctx(&[]);
        let path = ctx.resolve("file:///workspace/tests/my%20suite/a.kt").unwrap();
        assert_eq!(path, PathBuf::from("/workspace/tests/my suite/a.kt"));
    }

    #[test]
    fn dot_segments_are_normalized() {
        let ctx = ctx(&["suite2/foo.test"]);
        let path = ctx.resolve("./suite1/../suite2/foo.test").unwrap();
        assert!(ctx.scoped_file_name(&path).is_some());
    }

    #[test]
    fn empty_scope_keeps_everything() {
        let ctx = ctx(&[]);
        let path = ctx.resolve("any/file.kt").unwrap();
        assert_eq!(ctx.scoped_file_name(&path), Some(PathBuf::from("any/file.kt")));
    }

    #[test]
    fn out_of_scope_files_are_dropped() {
        let ctx = ctx(&["suite2/foo.test"]);
        let path = ctx.resolve("suite1/foo.test").unwrap();
        assert_eq!(ctx.scoped_file_name(&path), None);
    }

    #[test]
    fn foreign_schemes_are_rejected() {
        let ctx = ctx(&[]);
        assert!(ctx.resolve("https://example.com/a.kt").is_err());
        assert!(ctx.resolve("").is_err());
    }
}
