//! Path containment properties across the store API surface.

use lorekeeper_store::{KnowledgeStore, StoreError, TenantWorkspaces};

fn store() -> (tempfile::TempDir, KnowledgeStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::new(dir.path()).unwrap();
    (dir, store)
}

/// Paths whose normalized form stays inside the workspace.
const INSIDE: &[&str] = &[
    "plain.md",
    "nested/deep/doc.md",
    "./dotted.md",
    "a/./b/../sibling.md",
];

/// Paths that escape the workspace after normalization.
const ESCAPING: &[&str] = &[
    "../outside.md",
    "../../etc/hosts",
    "a/../../outside.md",
    "/etc/hosts",
];

#[tokio::test]
async fn test_inside_paths_never_fail_for_containment() {
    let (_dir, store) = store();
    for path in INSIDE {
        // Write + read succeed outright
        store.write_file(path, "content").await.unwrap();
        assert_eq!(store.read_file(path).await.unwrap(), "content");
        assert!(store.exists(path).await);
    }
    // A missing inside path fails for existence reasons, never containment
    let err = store.read_file("inside/but/missing.md").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_escaping_paths_fail_closed_without_io() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("workspace");
    let store = KnowledgeStore::new(&root).unwrap();

    for path in ESCAPING {
        let write = store.write_file(path, "pwned").await.unwrap_err();
        assert!(write.is_security(), "write {path} should be a security error");

        let read = store.read_file(path).await.unwrap_err();
        assert!(read.is_security(), "read {path} should be a security error");

        let delete = store.delete_file(path).await.unwrap_err();
        assert!(delete.is_security());

        let rename_src = store.rename_file(path, "dest.md").await.unwrap_err();
        assert!(rename_src.is_security());
        let rename_dest = store.rename_file("src.md", path).await.unwrap_err();
        assert!(rename_dest.is_security());

        let mkdir = store.create_directory(path).await.unwrap_err();
        assert!(mkdir.is_security());

        // exists never raises, it just says no
        assert!(!store.exists(path).await);
    }

    // Nothing appeared outside the workspace root
    let outside: Vec<_> = std::fs::read_dir(outer.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(outside, vec!["workspace"]);
    assert!(!outer.path().join("outside.md").exists());
}

#[tokio::test]
async fn test_security_and_not_found_stay_distinct() {
    let (_dir, store) = store();
    let security = store.read_file("../escape.md").await.unwrap_err();
    let not_found = store.read_file("missing.md").await.unwrap_err();

    assert!(security.is_security() && !security.is_not_found());
    assert!(not_found.is_not_found() && !not_found.is_security());
    assert!(security.to_string().contains("path traversal"));
}

#[tokio::test]
async fn test_update_idempotency_property() {
    let (_dir, store) = store();
    store.write_file("cas.md", "old").await.unwrap();

    // First CAS with correct precondition succeeds
    store.update_file("cas.md", "old", "new").await.unwrap();
    // Second CAS with the same precondition fails stale, file keeps the
    // result of the first call
    let err = store.update_file("cas.md", "old", "newer").await.unwrap_err();
    assert!(err.is_stale());
    assert_eq!(store.read_file("cas.md").await.unwrap(), "new");
}

#[tokio::test]
async fn test_update_missing_file_is_not_found() {
    let (_dir, store) = store();
    let err = store.update_file("ghost.md", "a", "b").await.unwrap_err();
    assert!(err.is_not_found());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_is_rejected() {
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "outside data").unwrap();

    let (dir, store) = store();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("portal")).unwrap();

    let err = store.read_file("portal/secret.txt").await.unwrap_err();
    assert!(err.is_security());
    assert!(!store.exists("portal/secret.txt").await);
}

#[tokio::test]
async fn test_tenant_sanitization_contains_workspaces() {
    let dir = tempfile::tempdir().unwrap();
    let workspaces = TenantWorkspaces::new(dir.path()).unwrap();

    for tenant in ["../intruder", "a/b/c", "x\\y", "..", "c:evil"] {
        let workspace = workspaces.resolve(Some(tenant)).unwrap();
        assert_eq!(workspace.parent().unwrap(), dir.path(), "tenant {tenant}");
    }

    // Post-sanitization emptiness is rejected loudly
    let err = workspaces.resolve(Some("   ")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
