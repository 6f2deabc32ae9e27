//! Path Security & Tenant Workspaces
//!
//! Every caller-supplied path is resolved and containment-checked here
//! before any I/O happens. Tenant identifiers are untrusted strings; the
//! sanitizer maps each one to a single safe path segment, and that segment
//! is the only isolation boundary between tenants sharing one store.

use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Map an untrusted tenant identifier to one inert path segment.
///
/// Pure and total: every separator and parent-reference sequence becomes an
/// underscore. Rejecting the post-sanitization empty case is the caller's
/// job ([`TenantWorkspaces::resolve`]).
pub fn sanitize_tenant_id(id: &str) -> String {
    let mut out = id.replace("..", "_");
    out = out
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    out
}

/// Lexically normalize a caller-supplied relative path.
///
/// Rejects absolute paths outright, drops `.` segments, and resolves `..`
/// against the segments seen so far; a `..` with nothing left to pop means
/// the path escapes the workspace and is rejected as a security violation.
pub fn normalize_relative(rel: &str) -> StoreResult<PathBuf> {
    let path = Path::new(rel);
    if path.is_absolute() {
        return Err(StoreError::security(format!(
            "path traversal: absolute path not allowed: {rel}"
        )));
    }

    let mut segments: Vec<std::ffi::OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(seg) => segments.push(seg.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(StoreError::security(format!(
                        "path traversal: {rel} escapes the workspace"
                    )));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::security(format!(
                    "path traversal: absolute path not allowed: {rel}"
                )));
            }
        }
    }

    let mut out = PathBuf::new();
    for seg in segments {
        out.push(seg);
    }
    Ok(out)
}

/// Resolve a relative path inside a workspace root, failing closed.
///
/// After lexical normalization the nearest existing ancestor of the joined
/// path is canonicalized and prefix-checked against the canonicalized root,
/// so a symlink pointing outside the workspace is caught before the
/// underlying I/O call is made.
pub fn resolve_in_workspace(root: &Path, rel: &str) -> StoreResult<PathBuf> {
    let normalized = normalize_relative(rel)?;
    let joined = root.join(&normalized);

    let canonical_root = root.canonicalize().map_err(|e| {
        StoreError::validation(format!(
            "workspace root {} is not accessible: {e}",
            root.display()
        ))
    })?;

    // Walk up to the nearest ancestor that exists on disk; the path itself
    // may be about to be created.
    let mut probe: &Path = &joined;
    let canonical_probe = loop {
        match probe.canonicalize() {
            Ok(canonical) => break canonical,
            Err(_) => match probe.parent() {
                Some(parent) => probe = parent,
                None => {
                    return Err(StoreError::security(format!(
                        "path traversal: cannot resolve {rel}"
                    )))
                }
            },
        }
    };

    if !canonical_probe.starts_with(&canonical_root) {
        return Err(StoreError::security(format!(
            "path traversal: {rel} resolves outside the workspace"
        )));
    }

    Ok(joined)
}

/// Resolver mapping tenant identifiers to isolated workspace roots.
///
/// Workspaces are subdirectories of one global root, created lazily on
/// first access. Operating without a tenant id uses the global root
/// directly as a single implicit tenant.
#[derive(Debug, Clone)]
pub struct TenantWorkspaces {
    root: PathBuf,
}

impl TenantWorkspaces {
    /// Create a resolver over the given global root, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The global root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tenant's workspace root, creating it on first access.
    ///
    /// An id that sanitizes to empty or whitespace is rejected loudly; it
    /// would otherwise silently collapse into the global root.
    pub fn resolve(&self, tenant: Option<&str>) -> StoreResult<PathBuf> {
        let Some(tenant) = tenant else {
            return Ok(self.root.clone());
        };

        let sanitized = sanitize_tenant_id(tenant);
        if sanitized.trim().is_empty() {
            return Err(StoreError::validation(format!(
                "tenant id {tenant:?} sanitizes to an empty path segment"
            )));
        }

        // The sanitized id is a single segment, but containment is still
        // checked through the same primitive every document path goes
        // through.
        let workspace = resolve_in_workspace(&self.root, &sanitized)?;
        if workspace == self.root {
            return Err(StoreError::validation(format!(
                "tenant id {tenant:?} does not name a workspace of its own"
            )));
        }
        std::fs::create_dir_all(&workspace)?;
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize_tenant_id("acme"), "acme");
        assert_eq!(sanitize_tenant_id("a/b"), "a_b");
        assert_eq!(sanitize_tenant_id("a\\b"), "a_b");
        assert_eq!(sanitize_tenant_id("../etc"), "__etc");
    }

    #[test]
    fn test_sanitize_is_total() {
        // Never panics, always returns a single segment
        for id in ["", "..", "../..", "/", "\\\\", "a:b", "\0"] {
            let out = sanitize_tenant_id(id);
            assert!(!out.contains('/'));
            assert!(!out.contains('\\'));
            assert!(!out.contains(".."));
        }
    }

    #[test]
    fn test_normalize_plain_path() {
        let p = normalize_relative("notes/daily/today.md").unwrap();
        assert_eq!(p, PathBuf::from("notes/daily/today.md"));
    }

    #[test]
    fn test_normalize_resolves_dot_segments() {
        let p = normalize_relative("notes/./sub/../today.md").unwrap();
        assert_eq!(p, PathBuf::from("notes/today.md"));
    }

    #[test]
    fn test_normalize_rejects_escape() {
        let err = normalize_relative("../outside.txt").unwrap_err();
        assert!(err.is_security());
        assert!(err.to_string().contains("path traversal"));

        let err = normalize_relative("notes/../../outside.txt").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn test_normalize_rejects_absolute() {
        let err = normalize_relative("/etc/hosts").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn test_resolve_in_workspace_contains() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_in_workspace(dir.path(), "notes/a.md").unwrap();
        assert!(resolved.starts_with(dir.path()));
    }

    #[test]
    fn test_resolve_in_workspace_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_in_workspace(dir.path(), "../../etc/hosts").unwrap_err();
        assert!(err.is_security());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = resolve_in_workspace(dir.path(), "link/secret.txt").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn test_tenant_workspaces_lazy_creation() {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = TenantWorkspaces::new(dir.path()).unwrap();

        let ws = workspaces.resolve(Some("acme")).unwrap();
        assert!(ws.exists());
        assert_eq!(ws, dir.path().join("acme"));
    }

    #[test]
    fn test_tenant_workspaces_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = TenantWorkspaces::new(dir.path()).unwrap();

        let a = workspaces.resolve(Some("../escape")).unwrap();
        assert!(a.starts_with(dir.path()));
        assert_ne!(a, dir.path());
    }

    #[test]
    fn test_tenant_workspaces_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = TenantWorkspaces::new(dir.path()).unwrap();

        assert!(workspaces.resolve(Some("")).is_err());
        assert!(workspaces.resolve(Some("   ")).is_err());
        // "." normalizes away entirely and would collapse into the root
        assert!(workspaces.resolve(Some(".")).is_err());
    }

    #[test]
    fn test_no_tenant_uses_global_root() {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = TenantWorkspaces::new(dir.path()).unwrap();
        assert_eq!(workspaces.resolve(None).unwrap(), dir.path());
    }
}
