//! Resource path policy: maps a request path to a file inside the allowed
//! root, or refuses it.
//!
//! # Resolution steps
//!
//! ```text
//! "local-resource://media/My%20Clip.mp4"
//!   1. strip scheme and leading '/'          → "media/My%20Clip.mp4"
//!   2. syntactic checks on the raw text      → no "..", NUL, absolute path
//!   3. percent-decode                        → "media/My Clip.mp4"
//!   4. same syntactic checks again
//!   5. join onto the root and canonicalize   → follows symlinks
//!   6. canonical path must start with the canonical root
//!   7. must be a regular file
//! ```
//!
//! Steps 2 and 4 reject traversal before the filesystem is touched.  Step 6
//! catches what they cannot see: a symlink inside the root that points
//! outside it.
//!
//! Security rejections are logged at `warn` with `target: "security"`.  The
//! resolved real path only ever appears in the log, never in a response.

use std::io;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, warn};

/// Scheme prefix the output surface may leave on a resource path.
pub const RESOURCE_SCHEME: &str = "local-resource://";

/// Why a resource could not be served.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The path tries to leave the allowed root.  Maps to 403.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    /// Nothing servable at that path.  Maps to 404.
    #[error("not found")]
    NotFound,
    /// Unexpected I/O failure.  Maps to 500.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResourceError {
    /// HTTP status code for this rejection.
    pub fn status(&self) -> u16 {
        match self {
            ResourceError::Forbidden(_) => 403,
            ResourceError::NotFound => 404,
            ResourceError::Io(_) => 500,
        }
    }

    /// Fixed response body.  Never contains a path.
    pub fn body(&self) -> &'static str {
        match self {
            ResourceError::Forbidden(_) => "Forbidden",
            ResourceError::NotFound => "Not Found",
            ResourceError::Io(_) => "Internal Server Error",
        }
    }
}

/// A file that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Canonical path inside the root.
    pub path: PathBuf,
    pub len: u64,
}

/// Resolves request paths against one allowed root.
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    root: PathBuf,
}

impl ResourcePolicy {
    /// Canonicalizes `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `root` does not exist or cannot be resolved.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    /// The canonical allowed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `request_path` to a file inside the root.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Forbidden`] for traversal, absolute paths, NUL
    ///   bytes, undecodable escapes, or a canonical path outside the root.
    /// - [`ResourceError::NotFound`] if nothing exists there, or it is not a
    ///   regular file.
    /// - [`ResourceError::Io`] for any other filesystem failure.
    pub fn resolve(&self, request_path: &str) -> Result<ResolvedResource, ResourceError> {
        let raw = strip_prefix(request_path);

        if let Err(reason) = check_syntax(raw) {
            return Err(self.forbid(request_path, reason, None));
        }
        let decoded = match percent_decode_str(raw).decode_utf8() {
            Ok(d) => d,
            Err(_) => return Err(self.forbid(request_path, "invalid percent-encoding", None)),
        };
        if let Err(reason) = check_syntax(&decoded) {
            return Err(self.forbid(request_path, reason, None));
        }

        let relative = decoded.trim_start_matches('/');
        if relative.is_empty() {
            return Err(ResourceError::NotFound);
        }

        let canonical = match self.root.join(relative).canonicalize() {
            Ok(p) => p,
            Err(e) if is_missing(&e) => {
                debug!(request = request_path, "resource does not exist");
                return Err(ResourceError::NotFound);
            }
            Err(e) => return Err(ResourceError::Io(e)),
        };

        if !canonical.starts_with(&self.root) {
            return Err(self.forbid(request_path, "resolves outside root", Some(&canonical)));
        }

        // The file may vanish between canonicalize and here.
        let metadata = match std::fs::metadata(&canonical) {
            Ok(m) => m,
            Err(e) if is_missing(&e) => return Err(ResourceError::NotFound),
            Err(e) => return Err(ResourceError::Io(e)),
        };
        if !metadata.is_file() {
            debug!(request = request_path, "not a regular file");
            return Err(ResourceError::NotFound);
        }

        Ok(ResolvedResource {
            path: canonical,
            len: metadata.len(),
        })
    }

    fn forbid(&self, request: &str, reason: &'static str, resolved: Option<&Path>) -> ResourceError {
        match resolved {
            Some(path) => warn!(
                target: "security",
                request,
                resolved = %path.display(),
                root = %self.root.display(),
                "rejected resource request: {reason}"
            ),
            None => warn!(target: "security", request, "rejected resource request: {reason}"),
        }
        ResourceError::Forbidden(reason)
    }
}

/// Removes the scheme and any leading slashes.
fn strip_prefix(request_path: &str) -> &str {
    request_path
        .strip_prefix(RESOURCE_SCHEME)
        .unwrap_or(request_path)
        .trim_start_matches('/')
}

/// True for lookups that failed because nothing is there, including a path
/// that continues below a regular file (`clip.mp4/x`, ENOTDIR).
fn is_missing(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::NotFound {
        return true;
    }
    #[cfg(unix)]
    {
        // ENOTDIR is 20 on Linux and the BSDs.
        if error.raw_os_error() == Some(20) {
            return true;
        }
    }
    false
}

/// Checks that need no filesystem access.  Applied before and after decoding.
fn check_syntax(path: &str) -> Result<(), &'static str> {
    if path.contains('\0') {
        return Err("NUL byte");
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err("parent-directory segment");
    }
    if path.starts_with('\\') || has_drive_prefix(path) {
        return Err("absolute path");
    }
    if Path::new(path)
        .components()
        .any(|c| matches!(c, Component::Prefix(_)))
    {
        return Err("absolute path");
    }
    Ok(())
}

/// `C:` style prefixes, checked on every platform.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Root with `media/clip.mp4` inside and `secret.txt` next to it.
    fn fixture() -> (TempDir, ResourcePolicy) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("media")).expect("mkdir");
        fs::write(root.join("media/clip.mp4"), b"0123456789").expect("write");
        fs::write(root.join("media/My Clip.mp4"), b"spaced").expect("write");
        fs::write(dir.path().join("secret.txt"), b"top secret").expect("write");
        let policy = ResourcePolicy::new(&root).expect("policy");
        (dir, policy)
    }

    #[test]
    fn test_file_inside_root_resolves() {
        // Arrange
        let (_dir, policy) = fixture();

        // Act
        let resolved = policy
            .resolve("local-resource://media/clip.mp4")
            .expect("resolves");

        // Assert
        assert!(resolved.path.starts_with(policy.root()));
        assert_eq!(resolved.len, 10);
    }

    #[test]
    fn test_percent_encoded_name_resolves() {
        let (_dir, policy) = fixture();

        let resolved = policy.resolve("/media/My%20Clip.mp4").expect("resolves");

        assert_eq!(resolved.len, 6);
    }

    #[test]
    fn test_parent_segments_are_forbidden() {
        let (_dir, policy) = fixture();

        for path in [
            "../secret.txt",
            "media/../../secret.txt",
            "media/..",
            "%2e%2e/secret.txt",
            "media/%2E%2E/%2e%2e/secret.txt",
            "media\\..\\..\\secret.txt",
            "local-resource://../secret.txt",
        ] {
            let result = policy.resolve(path);
            assert!(
                matches!(result, Err(ResourceError::Forbidden(_))),
                "{path}: {result:?}"
            );
        }
    }

    #[test]
    fn test_absolute_and_nul_paths_are_forbidden() {
        let (_dir, policy) = fixture();

        for path in ["C:/Windows/win.ini", "\\\\server\\share", "media/clip.mp4%00", "%5c..%5csecret.txt"] {
            assert!(
                matches!(policy.resolve(path), Err(ResourceError::Forbidden(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn test_leading_slashes_stay_inside_root() {
        let (_dir, policy) = fixture();

        let resolved = policy.resolve("//media/clip.mp4").expect("resolves");

        assert!(resolved.path.starts_with(policy.root()));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, policy) = fixture();

        let result = policy.resolve("media/missing.mp4");

        assert!(matches!(result, Err(ResourceError::NotFound)));
        assert_eq!(result.unwrap_err().status(), 404);
    }

    #[test]
    fn test_path_below_a_file_is_not_found() {
        // Arrange
        let (_dir, policy) = fixture();

        for path in ["media/clip.mp4/x", "media/clip.mp4/", "media/clip.mp4/a/b.mp4"] {
            // Act
            let result = policy.resolve(path);

            // Assert
            assert!(matches!(result, Err(ResourceError::NotFound)), "{path}: {result:?}");
        }
    }

    #[test]
    fn test_missing_lookup_errors_are_classified() {
        assert!(is_missing(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_missing(&io::Error::from(io::ErrorKind::PermissionDenied)));
        #[cfg(unix)]
        assert!(is_missing(&io::Error::from_raw_os_error(20)));
    }

    #[test]
    fn test_directory_and_empty_path_are_not_found() {
        let (_dir, policy) = fixture();

        assert!(matches!(policy.resolve("media"), Err(ResourceError::NotFound)));
        assert!(matches!(policy.resolve(""), Err(ResourceError::NotFound)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_root_is_forbidden() {
        // Arrange
        let (dir, policy) = fixture();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            policy.root().join("media/innocent.mp4"),
        )
        .expect("symlink");

        // Act
        let result = policy.resolve("media/innocent.mp4");

        // Assert
        let err = result.expect_err("escape must be refused");
        assert_eq!(err.status(), 403);
        assert_eq!(err.body(), "Forbidden");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root_is_served() {
        let (_dir, policy) = fixture();
        std::os::unix::fs::symlink(
            policy.root().join("media/clip.mp4"),
            policy.root().join("media/alias.mp4"),
        )
        .expect("symlink");

        let resolved = policy.resolve("media/alias.mp4").expect("resolves");

        assert!(resolved.path.ends_with("media/clip.mp4"));
    }

    #[test]
    fn test_error_bodies_never_contain_paths() {
        let errors = [
            ResourceError::Forbidden("resolves outside root"),
            ResourceError::NotFound,
            ResourceError::Io(io::Error::new(io::ErrorKind::Other, "/etc/passwd")),
        ];

        let bodies: Vec<_> = errors.iter().map(|e| (e.status(), e.body())).collect();

        assert_eq!(
            bodies,
            vec![(403, "Forbidden"), (404, "Not Found"), (500, "Internal Server Error")]
        );
    }

    proptest! {
        #[test]
        fn prop_any_parent_segment_is_forbidden(
            before in proptest::collection::vec("[a-z]{1,8}", 0..4),
            after in proptest::collection::vec("[a-z]{1,8}", 0..4),
            encoded in any::<bool>(),
            backslash in any::<bool>(),
        ) {
            let (_dir, policy) = fixture();
            let dots = if encoded { "%2e%2e" } else { ".." };
            let sep = if backslash { "\\" } else { "/" };
            let mut segments = before.clone();
            segments.push(dots.to_string());
            segments.extend(after.iter().cloned());
            let path = segments.join(sep);

            let result = policy.resolve(&path);

            prop_assert!(matches!(result, Err(ResourceError::Forbidden(_))), "{}", path);
        }

        #[test]
        fn prop_resolved_paths_never_leave_root(name in "[a-zA-Z0-9 ._%/-]{0,40}") {
            let (_dir, policy) = fixture();

            if let Ok(resolved) = policy.resolve(&name) {
                prop_assert!(resolved.path.starts_with(policy.root()));
            }
        }
    }
}
