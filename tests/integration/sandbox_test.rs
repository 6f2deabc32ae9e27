//! Sandbox boundary tests: the closed environment, the denylist
//! prefilter, and the execution budgets.

use std::sync::Arc;
use std::time::Duration;

use lorekeeper_script::{EngineConfig, ScriptEngine};
use lorekeeper_store::KnowledgeStore;

fn capability() -> (tempfile::TempDir, Arc<KnowledgeStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(KnowledgeStore::new(dir.path()).unwrap());
    (dir, store)
}

#[tokio::test]
async fn test_closed_environment_is_the_real_boundary() {
    // Names the denylist does not mention still resolve to nothing
    let (_dir, store) = capability();
    let engine = ScriptEngine::new();
    for code in [
        "readdir(\"/\");",
        "os.system(\"id\");",
        "Deno.readTextFile(\"/etc/passwd\");",
        "open(\"/etc/passwd\");",
    ] {
        let outcome = engine.execute(code, Arc::clone(&store)).await;
        assert!(!outcome.success, "expected failure for {code}");
        let error = outcome.error.unwrap();
        assert!(
            error.contains("not defined")
                || error.contains("not available")
                || error.contains("unknown method")
                || error.contains("cannot read member"),
            "unexpected error for {code}: {error}"
        );
    }
}

#[tokio::test]
async fn test_denylist_is_a_prefilter() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::new();
    let outcome = engine
        .execute("let x = require(\"child_process\");", store)
        .await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("not allowed"));
}

#[tokio::test]
async fn test_wall_clock_timeout_fires_across_awaits() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::with_config(EngineConfig {
        timeout: Duration::from_millis(50),
        max_steps: u64::MAX,
        ..Default::default()
    });
    // Every capability call is an await point, so the wall-clock budget
    // can interrupt this loop even though the step budget never would
    let outcome = engine
        .execute("while true { mem.exists(\"probe.md\"); }", store)
        .await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_timeout_leaves_partial_writes_in_place() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::with_config(EngineConfig {
        timeout: Duration::from_millis(100),
        max_steps: u64::MAX,
        ..Default::default()
    });
    let code = r#"
        mem.writeFile("partial.md", "written before the deadline");
        while true { mem.exists("probe.md"); }
    "#;
    let outcome = engine.execute(code, Arc::clone(&store)).await;
    assert!(!outcome.success);
    // No automatic rollback: the completed write survives
    assert_eq!(
        store.read_file("partial.md").await.unwrap(),
        "written before the deadline"
    );
}

#[tokio::test]
async fn test_capability_errors_become_outcomes_not_panics() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::new();

    let not_found = engine
        .execute("mem.readFile(\"missing.md\");", Arc::clone(&store))
        .await;
    assert!(!not_found.success);
    assert!(not_found.error.unwrap().starts_with("Not found:"));

    let stale = engine
        .execute(
            r#"
            mem.writeFile("cas.md", "v1");
            mem.updateFile("cas.md", "wrong expectation", "v2");
            "#,
            Arc::clone(&store),
        )
        .await;
    assert!(!stale.success);
    assert!(stale.error.unwrap().starts_with("Stale content:"));
    // The failed CAS left the file untouched
    assert_eq!(store.read_file("cas.md").await.unwrap(), "v1");
}

#[tokio::test]
async fn test_scripts_can_chain_capability_calls() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::new();
    let code = r#"
        mem.createDirectory("notes");
        mem.writeFile("notes/a.md", "alpha [[beta]]");
        mem.writeFile("notes/b.md", "beta");
        let links = mem.getOutgoingLinks("notes/a.md");
        let entries = mem.listEntries("notes");
        {links: links, count: len(entries)};
    "#;
    let outcome = engine.execute(code, store).await;
    assert!(outcome.success, "error: {:?}", outcome.error);
    let value: serde_json::Value = serde_json::from_str(&outcome.value.unwrap()).unwrap();
    assert_eq!(value["links"][0], "beta");
    assert_eq!(value["count"], 2.0);
}

#[tokio::test]
async fn test_console_output_does_not_reach_result() {
    let (_dir, store) = capability();
    let engine = ScriptEngine::new();
    let outcome = engine
        .execute("console.log(\"side\", \"channel\"); 7;", store)
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.value.unwrap(), "7.0");
}
