//! End-to-end agent loop scenarios driven by a scripted model provider.

use std::sync::Arc;

use crate::common::{agent_fixture, CollectingSink, FailingSink, ScriptedProvider};
use lorekeeper::{AgentConfig, FileSessionStore, SessionStore, NO_ANSWER_REPLY};
use lorekeeper_store::KnowledgeStore;

#[tokio::test]
async fn test_create_file_then_commit_then_reply() {
    let provider = ScriptedProvider::new(&[
        "<think>I will create the file first.</think>\
         <act>mem.writeFile(\"hello.txt\", \"world\");</act>",
        "<act>mem.commit(\"add hello.txt\");</act><reply>done</reply>",
    ]);
    let (dir, agent) = agent_fixture(provider.clone(), AgentConfig::default());

    let reply = agent
        .handle("create file hello.txt with content world", None, "s1")
        .await
        .unwrap();

    assert_eq!(reply, "done");
    assert_eq!(provider.call_count(), 2);

    // The file exists with the right content
    let store = KnowledgeStore::new(dir.path()).unwrap();
    assert_eq!(store.read_file("hello.txt").await.unwrap(), "world");

    // Exactly one commit beyond the provisioning baseline, with the
    // message the model gave
    let log = store.log(None, 10).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].message, "add hello.txt");
    assert_eq!(log[1].message, "workspace initialized");
}

#[tokio::test]
async fn test_path_traversal_feedback_reaches_next_turn() {
    let provider = ScriptedProvider::new(&[
        "<act>mem.readFile(\"../../etc/hosts\");</act>",
        "<reply>that path is outside my workspace</reply>",
    ]);
    let (dir, agent) = agent_fixture(provider, AgentConfig::default());

    let reply = agent.handle("read the hosts file", None, "s1").await.unwrap();
    assert_eq!(reply, "that path is outside my workspace");

    // The security violation was fed back as a synthetic user message
    let sessions = FileSessionStore::new();
    let history = sessions.load(dir.path(), "s1").await.unwrap().unwrap();
    let feedback = history
        .iter()
        .find(|m| m.content.starts_with("[action-error]"))
        .expect("execution feedback message");
    assert!(feedback.content.contains("path traversal"));

    // Nothing outside the workspace was touched, and nothing inside
    // either beyond session state
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert!(entries.iter().all(|name| name == ".sessions"));
}

#[tokio::test]
async fn test_turn_budget_exhaustion() {
    let config = AgentConfig {
        max_turns: 4,
        ..Default::default()
    };
    // The model reasons forever and never replies
    let provider = ScriptedProvider::repeating("<think>still thinking</think>", 10);
    let (_dir, agent) = agent_fixture(provider.clone(), config);

    let reply = agent.handle("anything", None, "s1").await.unwrap();
    assert_eq!(reply, NO_ANSWER_REPLY);
    // Exactly the configured number of model queries, no more
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test]
async fn test_reasoning_is_streamed() {
    let provider = ScriptedProvider::new(&[
        "<think>planning the note</think><reply>ok</reply>",
    ]);
    let sink = Arc::new(CollectingSink::default());
    let (_dir, agent) = agent_fixture(provider, AgentConfig::default());
    let agent = agent.with_stream_sink(sink.clone());

    let reply = agent.handle("hi", None, "s1").await.unwrap();
    assert_eq!(reply, "ok");

    let chunks = sink.chunks.lock().unwrap();
    assert_eq!(chunks.as_slice(), ["planning the note"]);
}

#[tokio::test]
async fn test_streaming_failure_does_not_abort_turn() {
    let provider = ScriptedProvider::new(&[
        "<think>doomed stream</think><reply>still fine</reply>",
    ]);
    let (_dir, agent) = agent_fixture(provider, AgentConfig::default());
    let agent = agent.with_stream_sink(Arc::new(FailingSink));

    let reply = agent.handle("hi", None, "s1").await.unwrap();
    assert_eq!(reply, "still fine");
}

#[tokio::test]
async fn test_action_result_feeds_next_turn() {
    let provider = ScriptedProvider::new(&[
        "<act>mem.writeFile(\"n.md\", \"alpha\"); mem.readFile(\"n.md\");</act>",
        "<reply>saw the content</reply>",
    ]);
    let (dir, agent) = agent_fixture(provider, AgentConfig::default());

    agent.handle("store alpha", None, "s1").await.unwrap();

    let sessions = FileSessionStore::new();
    let history = sessions.load(dir.path(), "s1").await.unwrap().unwrap();
    let feedback = history
        .iter()
        .find(|m| m.content.starts_with("[action-result]"))
        .expect("execution result message");
    assert!(feedback.content.contains("alpha"));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let provider_a = ScriptedProvider::new(&[
        "<act>mem.writeFile(\"secret.md\", \"tenant a data\");</act><reply>saved</reply>",
    ]);
    let (dir, agent) = agent_fixture(provider_a, AgentConfig::default());
    agent.handle("save", Some("alpha"), "s1").await.unwrap();

    assert!(dir.path().join("alpha/secret.md").exists());

    // A second tenant sees nothing of the first
    let store_b = KnowledgeStore::new(dir.path().join("beta")).unwrap();
    assert!(store_b.search_global("tenant a data").await.unwrap().is_empty());
    assert!(!store_b.exists("secret.md").await);
}

#[tokio::test]
async fn test_session_history_grows_across_calls() {
    let provider = ScriptedProvider::new(&[
        "<reply>first answer</reply>",
        "<reply>second answer</reply>",
    ]);
    let (dir, agent) = agent_fixture(provider, AgentConfig::default());

    agent.handle("first", None, "chat").await.unwrap();
    agent.handle("second", None, "chat").await.unwrap();

    let sessions = FileSessionStore::new();
    let history = sessions.load(dir.path(), "chat").await.unwrap().unwrap();
    // system + (user, assistant) * 2
    assert_eq!(history.len(), 5);
    assert!(history[0].content.contains("Lorekeeper"));
}
