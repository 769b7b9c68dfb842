//! End-to-end persona queries against a mock chat-completion server.

use letsgo_core::{LogLine, LogSettings, SessionLog};
use letsgo_personas::{ChatClient, Persona, PersonaKind};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

fn persona_for(kind: PersonaKind, url: String) -> Persona {
    Persona::new(
        kind.profile(),
        Arc::new(ChatClient::new(Some("test-key".to_string()), url)),
    )
}

fn tags(log: &SessionLog) -> Vec<String> {
    std::fs::read_to_string(log.path())
        .unwrap()
        .lines()
        .filter_map(LogLine::parse)
        .map(|r| r.tag)
        .collect()
}

#[tokio::test]
async fn test_johny_dive() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "model": "sonar-pro",
                "temperature": 0.5,
                "return_citations": false
            })),
            Matcher::Regex("what is ls\\?".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"content": "SonarPro here: ls lists directory contents [1]"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let log = SessionLog::open(&LogSettings::new(dir.path())).unwrap();
    let reply = persona_for(PersonaKind::Johny, server.url())
        .query("what is ls?", &log)
        .await;

    mock.assert_async().await;
    assert_eq!(reply, "🔍 Johny:\nJohny here: ls lists directory contents [truncated]");
    assert_eq!(tags(&log), vec!["session", "johny_user", "johny"]);
}

#[tokio::test]
async fn test_tony_deep_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"model": "sonar-reasoning", "max_tokens": 1500})))
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let log = SessionLog::open(&LogSettings::new(dir.path())).unwrap();
    let reply = persona_for(PersonaKind::Tony, server.url())
        .query("explain fork()", &log)
        .await;

    assert_eq!(reply, "❌ Tony deep reasoning ERROR: API error: 503 - overloaded");
    assert_eq!(tags(&log), vec!["session", "tony_user", "tony"]);
}
