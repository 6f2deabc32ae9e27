//! Checkpoint stack and working-tree semantics on real repositories.

use lorekeeper_store::{KnowledgeStore, COMMIT_NO_CHANGES};

fn store() -> (tempfile::TempDir, KnowledgeStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::new(dir.path()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_save_then_revert_restores_state() {
    let (_dir, store) = store();
    store.write_file("a.md", "original").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("a.md", "edited").await.unwrap();
    store.save_checkpoint().await.unwrap();

    // Changes made after the save are wiped by the pop's restore
    assert_eq!(store.read_file("a.md").await.unwrap(), "original");
    assert!(store.revert_to_last_checkpoint().await.unwrap());
    assert_eq!(store.read_file("a.md").await.unwrap(), "edited");
}

#[tokio::test]
async fn test_revert_with_no_checkpoint_is_false_and_inert() {
    let (_dir, store) = store();
    store.write_file("a.md", "content").await.unwrap();
    store.commit("baseline").await.unwrap();
    store.write_file("a.md", "dirty").await.unwrap();

    assert!(!store.revert_to_last_checkpoint().await.unwrap());
    // Nothing was mutated
    assert_eq!(store.read_file("a.md").await.unwrap(), "dirty");
}

#[tokio::test]
async fn test_checkpoints_pop_in_lifo_order() {
    let (_dir, store) = store();
    store.write_file("a.md", "v0").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("a.md", "v1").await.unwrap();
    store.save_checkpoint().await.unwrap();
    store.write_file("a.md", "v2").await.unwrap();
    store.save_checkpoint().await.unwrap();

    // Most recent first
    assert!(store.revert_to_last_checkpoint().await.unwrap());
    assert_eq!(store.read_file("a.md").await.unwrap(), "v2");

    store.discard_changes().await;
    assert!(store.revert_to_last_checkpoint().await.unwrap());
    assert_eq!(store.read_file("a.md").await.unwrap(), "v1");
}

#[tokio::test]
async fn test_revert_merges_shelved_changes_with_new_untracked_files() {
    // The dual-state merge: files created between save and revert stay in
    // place while the shelved changes come back on top of them.
    let (_dir, store) = store();
    store.write_file("a.md", "committed").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("a.md", "shelved edit").await.unwrap();
    store.save_checkpoint().await.unwrap();

    store.write_file("new.md", "created after save").await.unwrap();
    assert!(store.revert_to_last_checkpoint().await.unwrap());

    assert_eq!(store.read_file("a.md").await.unwrap(), "shelved edit");
    assert_eq!(
        store.read_file("new.md").await.unwrap(),
        "created after save"
    );
}

#[tokio::test]
async fn test_checkpoint_shelves_untracked_files_too() {
    let (_dir, store) = store();
    store.write_file("tracked.md", "x").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("fresh.md", "untracked content").await.unwrap();
    store.save_checkpoint().await.unwrap();
    assert!(!store.exists("fresh.md").await);

    assert!(store.revert_to_last_checkpoint().await.unwrap());
    assert_eq!(
        store.read_file("fresh.md").await.unwrap(),
        "untracked content"
    );
}

#[tokio::test]
async fn test_commit_sentinel_on_clean_tree() {
    let (_dir, store) = store();
    store.write_file("a.md", "x").await.unwrap();
    let first = store.commit("add a").await.unwrap();
    assert_ne!(first, COMMIT_NO_CHANGES);

    let second = store.commit("nothing changed").await.unwrap();
    assert_eq!(second, COMMIT_NO_CHANGES);

    // The no-op did not create a commit
    let log = store.log(None, 10).await.unwrap();
    assert_eq!(log.iter().filter(|c| c.message == "nothing changed").count(), 0);
}

#[tokio::test]
async fn test_discard_changes_resets_and_cleans() {
    let (_dir, store) = store();
    store.write_file("a.md", "committed").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("a.md", "dirty").await.unwrap();
    store.write_file("junk.md", "untracked").await.unwrap();
    assert!(store.discard_changes().await);

    assert_eq!(store.read_file("a.md").await.unwrap(), "committed");
    assert!(!store.exists("junk.md").await);
}

#[tokio::test]
async fn test_diff_and_log_scoped_to_path() {
    let (_dir, store) = store();
    store.write_file("a.md", "one\n").await.unwrap();
    store.write_file("b.md", "two\n").await.unwrap();
    store.commit("add both").await.unwrap();

    store.write_file("a.md", "one changed\n").await.unwrap();
    let diff = store.diff("a.md", None, None).await.unwrap();
    assert!(diff.contains("-one"));
    assert!(diff.contains("+one changed"));

    // b.md is untouched: empty diff
    assert!(store.diff("b.md", None, None).await.unwrap().is_empty());

    store.commit("change a").await.unwrap();
    let log_a = store.log(Some("a.md"), 10).await.unwrap();
    assert_eq!(log_a.len(), 2);
    assert_eq!(log_a[0].message, "change a");

    let log_b = store.log(Some("b.md"), 10).await.unwrap();
    assert_eq!(log_b.len(), 1);
}

#[tokio::test]
async fn test_status_summarizes_worktree() {
    let (_dir, store) = store();
    store.write_file("a.md", "x").await.unwrap();
    store.commit("baseline").await.unwrap();

    store.write_file("a.md", "y").await.unwrap();
    store.write_file("new.md", "z").await.unwrap();

    let status = store.staged_or_changed_files().await.unwrap();
    assert!(status.modified.contains(&"a.md".to_string()));
    assert!(status.untracked.contains(&"new.md".to_string()));
    assert!(!status.is_clean());
}
