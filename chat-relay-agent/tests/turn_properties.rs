use std::sync::Arc;

use chat_relay_agent::{
    advance, Agent, ChatHandlers, ModelBinding, RunConfig, Session, SessionKey, TurnReply,
    ERROR_PREFIX,
};
use chat_relay_core::config::AgentConfig;
use chat_relay_core::transport::BufferedTransport;
use chat_relay_providers::testing::{Scripted, ScriptedProvider};
use chat_relay_providers::{Message, Role};

fn session(provider: Arc<ScriptedProvider>) -> Session {
    let run_config = RunConfig::new(provider, ModelBinding::new("gemini-2.0-flash"));
    Session::new(
        "session",
        Arc::new(Agent::from_config(&AgentConfig::default())),
        Arc::new(run_config),
    )
}

fn handlers(provider: Arc<ScriptedProvider>) -> ChatHandlers {
    ChatHandlers::with_factory(
        AgentConfig::default(),
        Arc::new(move || -> chat_relay_core::Result<RunConfig> {
            Ok(RunConfig::new(
                provider.clone(),
                ModelBinding::new("gemini-2.0-flash"),
            ))
        }),
    )
}

#[tokio::test]
async fn history_grows_by_alternating_pairs() {
    let provider = Arc::new(ScriptedProvider::new());
    let mut session = session(provider);

    for k in 1..=5 {
        let reply = advance(&mut session, &format!("question {k}")).await;
        assert!(!reply.is_failure());
        assert_eq!(session.history.len(), 2 * k);
    }

    for (i, message) in session.history.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(message.role, expected, "turn {i}");
    }
}

#[tokio::test]
async fn failed_turn_leaves_history_unchanged() {
    let provider = Arc::new(ScriptedProvider::with_script([
        Scripted::Reply("a1".to_string()),
        Scripted::Fail("connection reset".to_string()),
        Scripted::Reply("a2".to_string()),
    ]));
    let mut session = session(provider.clone());

    advance(&mut session, "q1").await;
    let before = session.history.clone();

    let failed = advance(&mut session, "q2").await;
    assert!(failed.is_failure());
    assert_eq!(session.history, before);

    // Retrying starts clean: the unanswered message is not duplicated.
    advance(&mut session, "q2").await;
    let retry = &provider.calls()[2].messages;
    let q2_count = retry
        .iter()
        .filter(|m| m.role == Role::User && m.content == "q2")
        .count();
    assert_eq!(q2_count, 1);
    assert_eq!(session.history.len(), 4);
}

#[tokio::test]
async fn first_question_gets_reply_and_two_entries() {
    let provider = Arc::new(ScriptedProvider::with_script([Scripted::Reply(
        "Hello! The front desk can be reached at extension 100.".to_string(),
    )]));
    let mut session = session(provider);

    let reply = advance(&mut session, "What is the number for front desk?").await;

    match reply {
        TurnReply::Reply(text) => assert!(!text.is_empty()),
        TurnReply::Failed(text) => panic!("unexpected failure: {text}"),
    }
    assert_eq!(session.history.len(), 2);
    assert_eq!(
        session.history[0],
        Message::user("What is the number for front desk?")
    );
}

#[tokio::test]
async fn failure_text_carries_fixed_prefix() {
    let provider = Arc::new(ScriptedProvider::with_script([Scripted::Fail(
        "HTTP 429 Too Many Requests: quota".to_string(),
    )]));
    let mut session = session(provider);

    let reply = advance(&mut session, "hi").await;

    assert!(reply.text().starts_with(ERROR_PREFIX));
    assert!(reply.text().contains("quota"));
}

#[tokio::test]
async fn second_turn_sees_full_prior_history() {
    let provider = Arc::new(ScriptedProvider::new());
    let mut session = session(provider.clone());

    advance(&mut session, "first").await;
    advance(&mut session, "second").await;

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);

    let conversation: Vec<&Message> = calls[1]
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .collect();
    assert_eq!(conversation.len(), 3);
    assert_eq!(*conversation[0], Message::user("first"));
    assert_eq!(*conversation[1], Message::assistant("echo: first"));
    assert_eq!(*conversation[2], Message::user("second"));
    assert_eq!(calls[1].messages[0].role, Role::System);
}

#[tokio::test]
async fn sessions_do_not_leak_into_each_other() {
    let provider = Arc::new(ScriptedProvider::new());
    let handlers = handlers(provider.clone());
    let transport_a = BufferedTransport::new();
    let transport_b = BufferedTransport::new();

    handlers.on_chat_start("a", &transport_a).await.unwrap();
    handlers.on_chat_start("b", &transport_b).await.unwrap();

    handlers
        .on_message("a", "secret for a", &transport_a)
        .await
        .unwrap();
    handlers.on_message("b", "hello b", &transport_b).await.unwrap();

    let history_b = handlers
        .store()
        .get("b", SessionKey::History)
        .await
        .unwrap()
        .into_history()
        .unwrap();
    assert_eq!(history_b.len(), 2);
    assert!(history_b.iter().all(|m| !m.content.contains("secret")));

    let call_b = &provider.calls()[1].messages;
    assert!(call_b.iter().all(|m| !m.content.contains("secret")));

    assert!(transport_b
        .messages()
        .iter()
        .all(|m| !m.content.contains("secret")));

    handlers.on_chat_end("a");
    assert_eq!(handlers.store().history("b").await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_turns_in_one_session_are_serialized() {
    let provider = Arc::new(ScriptedProvider::new());
    let handlers = Arc::new(handlers(provider));
    let transport = Arc::new(BufferedTransport::new());
    handlers.on_chat_start("s", transport.as_ref()).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..4 {
        let handlers = handlers.clone();
        let transport = transport.clone();
        tasks.push(tokio::spawn(async move {
            handlers
                .on_message("s", &format!("m{i}"), transport.as_ref())
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        assert!(!task.await.unwrap().is_failure());
    }

    let history = handlers.store().history("s").await.unwrap();
    assert_eq!(history.len(), 8);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
    }
}
