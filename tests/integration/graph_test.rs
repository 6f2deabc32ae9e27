//! Graph query and link analysis over documents on disk.

use lorekeeper_store::KnowledgeStore;

async fn seeded_store() -> (tempfile::TempDir, KnowledgeStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = KnowledgeStore::new(dir.path()).unwrap();

    store
        .write_file(
            "projects/atlas.md",
            "title:: Project Atlas\nstatus:: active\n\
             Kickoff with [[Alice]] and [[Bob]].\nSee [[Roadmap 2026]].",
        )
        .await
        .unwrap();
    store
        .write_file(
            "people/alice.md",
            "role:: engineer\nWorks on [[atlas]] with [[Bob]].",
        )
        .await
        .unwrap();
    store
        .write_file("people/bob.md", "role:: designer\nNo links here.")
        .await
        .unwrap();

    (dir, store)
}

#[tokio::test]
async fn test_outgoing_backlink_symmetry() {
    let (_dir, store) = seeded_store().await;

    // alice.md links to atlas; atlas.md links to Alice — both directions
    // of the symmetry property hold
    let alice_out = store.outgoing_links("people/alice.md").await.unwrap();
    assert!(alice_out.iter().any(|l| l.eq_ignore_ascii_case("atlas")));
    let atlas_backs = store.backlinks("projects/atlas.md").await.unwrap();
    assert_eq!(atlas_backs, vec!["people/alice.md"]);

    let atlas_out = store.outgoing_links("projects/atlas.md").await.unwrap();
    assert!(atlas_out.iter().any(|l| l.eq_ignore_ascii_case("alice")));
    let alice_backs = store.backlinks("people/alice.md").await.unwrap();
    assert_eq!(alice_backs, vec!["projects/atlas.md"]);
}

#[tokio::test]
async fn test_backlinks_match_case_insensitively() {
    let (_dir, store) = seeded_store().await;
    // bob.md is linked as [[Bob]] from two documents
    let backs = store.backlinks("people/bob.md").await.unwrap();
    assert_eq!(backs.len(), 2);
    assert!(backs.contains(&"people/alice.md".to_string()));
    assert!(backs.contains(&"projects/atlas.md".to_string()));
}

#[tokio::test]
async fn test_property_and_link_conjunction() {
    let (_dir, store) = seeded_store().await;

    let results = store
        .query_graph("status:: ACTIVE AND [[alice]]")
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "projects/atlas.md");

    // One clause failing drops the document
    let results = store
        .query_graph("status:: retired AND [[alice]]")
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_link_substring_clause() {
    let (_dir, store) = seeded_store().await;
    let results = store.query_graph("link:roadmap").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "projects/atlas.md");
    assert!(results[0].matches[0].contains("Roadmap 2026"));
}

#[tokio::test]
async fn test_unrecognized_query_yields_empty_not_error() {
    let (_dir, store) = seeded_store().await;
    assert!(store.query_graph("SELECT * FROM docs").await.unwrap().is_empty());
    assert!(store.query_graph("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_reflects_current_disk_state() {
    let (_dir, store) = seeded_store().await;
    assert!(store.query_graph("status:: paused").await.unwrap().is_empty());

    store
        .write_file("projects/atlas.md", "status:: paused")
        .await
        .unwrap();
    // No index to go stale: the next query sees the new content
    let results = store.query_graph("status:: paused").await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_search_global() {
    let (_dir, store) = seeded_store().await;

    let hits = store.search_global("KICKOFF").await.unwrap();
    assert_eq!(hits, vec!["projects/atlas.md"]);

    // Empty query matches every document
    let all = store.search_global("").await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_session_records_are_not_documents() {
    let (_dir, store) = seeded_store().await;
    // A session record containing a searchable term stays invisible to
    // graph and search scans
    std::fs::create_dir_all(store.workspace_root().join(".sessions")).unwrap();
    std::fs::write(
        store.workspace_root().join(".sessions/s1.json"),
        "{\"messages\": \"Kickoff\"}",
    )
    .unwrap();

    let hits = store.search_global("kickoff").await.unwrap();
    assert_eq!(hits, vec!["projects/atlas.md"]);
}
