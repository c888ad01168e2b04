// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end turn tests over the mock adapters and a temp SQLite store.

use std::sync::Arc;
use std::time::Duration;

use flowbridge_agent::directive::ControlDirective;
use flowbridge_agent::keywords::KeywordAction;
use flowbridge_agent::{BridgeLoop, EngineStatus, IgnoreReason, TurnOutcome, TurnReport};
use flowbridge_config::IntegrationConfig;
use flowbridge_core::types::{
    BotReplyUnit, ChoiceItem, ConversationStatus, FlowReply, FlowSessionId, OwnerAssignment,
    PromptDescriptor, QueueId, RichText, TicketUpdate, UserId,
};
use flowbridge_core::{BridgeError, ConversationStore};
use flowbridge_test_utils::harness::{TEST_SENDER, default_integration};
use flowbridge_test_utils::{MockFlowEngine, TestHarness};
use tokio_util::sync::CancellationToken;

fn processed(outcome: TurnOutcome) -> TurnReport {
    match outcome {
        TurnOutcome::Processed(report) => report,
        TurnOutcome::Ignored(reason) => panic!("turn ignored: {reason:?}"),
    }
}

fn text_unit(text: &str) -> BotReplyUnit {
    BotReplyUnit::Text(RichText::plain(text))
}

#[tokio::test]
async fn first_message_starts_then_continues_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["Welcome!"]).await;

    let report = processed(harness.send("hi").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Replied);
    assert_eq!(harness.engine.start_count().await, 1);
    let contacts = harness.engine.started_contacts().await;
    assert_eq!(contacts[0].number, "5511999990000");
    assert_eq!(contacts[0].push_name, "Test User");

    let calls = harness.engine.continue_calls().await;
    assert_eq!(
        calls,
        vec![(FlowSessionId("mock-session-1".into()), "hi".to_string())]
    );
    // The session was already stored when the continue call went out.
    assert_eq!(
        harness.engine.stored_sessions_at_continue().await,
        vec![vec![FlowSessionId("mock-session-1".into())]]
    );

    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(
        conversation.session_id,
        Some(FlowSessionId("mock-session-1".into()))
    );
    assert_eq!(conversation.owner, OwnerAssignment::Bot);
    assert_eq!(harness.channel.sent_texts().await, vec!["Welcome!"]);
}

#[tokio::test]
async fn follow_up_message_reuses_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["one"]).await;
    harness.engine.push_texts(&["two"]).await;

    harness.send("first").await.unwrap();
    harness.send("second").await.unwrap();

    assert_eq!(harness.engine.start_count().await, 1);
    let calls = harness.engine.continue_calls().await;
    assert_eq!(calls[0].0, calls[1].0);
    assert_eq!(harness.channel.sent_texts().await, vec!["one", "two"]);
}

#[tokio::test]
async fn stop_directive_hands_off_without_sending() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&[r##"#{"stopBot":true}"##]).await;

    let report = processed(harness.send("agent please").await.unwrap());

    assert_eq!(report.directive, Some(ControlDirective::StopAutomation));
    assert_eq!(harness.channel.sent_count().await, 0);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(!conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Unassigned);
    assert_eq!(conversation.session_id, None);

    let updates = harness.ticketing.updates().await;
    assert_eq!(updates.len(), 2, "session binding, then the stop");
    assert_eq!(
        updates[1].1,
        TicketUpdate {
            automation_active: Some(false),
            integration_id: Some(None),
            ..TicketUpdate::default()
        }
    );
}

#[tokio::test]
async fn rejected_stop_keeps_bot_ownership() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["hello"]).await;
    harness.send("hi").await.unwrap();
    harness.ticketing.set_fail(true);
    harness.engine.push_texts(&[r##"#{"stopBot":true}"##]).await;

    let err = harness.send("agent please").await.unwrap_err();

    assert!(matches!(err, BridgeError::Ownership { .. }));
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Bot);
}

#[tokio::test]
async fn session_start_binds_ticket_to_integration() {
    let mut integration = default_integration();
    integration.integration_id = Some(42);
    let harness = TestHarness::builder()
        .with_integration(integration)
        .build()
        .await
        .unwrap();
    harness.engine.push_texts(&["Welcome!"]).await;
    harness.engine.push_texts(&["again"]).await;

    harness.send("hi").await.unwrap();
    harness.send("more").await.unwrap();

    let updates = harness.ticketing.updates().await;
    assert_eq!(updates.len(), 1, "only a new session binds the ticket");
    assert_eq!(updates[0].0.ticket_id, 7);
    assert_eq!(
        updates[0].1,
        TicketUpdate {
            automation_active: Some(true),
            integration_id: Some(Some(42)),
            ..TicketUpdate::default()
        }
    );
}

#[tokio::test]
async fn rejected_binding_still_runs_the_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.ticketing.set_fail(true);
    harness.engine.push_texts(&["Welcome!"]).await;

    let report = processed(harness.send("hi").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Replied);
    assert_eq!(harness.channel.sent_texts().await, vec!["Welcome!"]);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(
        conversation.session_id,
        Some(FlowSessionId("mock-session-1".into()))
    );
}

#[tokio::test]
async fn choice_prompt_becomes_one_message() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .engine
        .push_reply(FlowReply {
            units: Vec::new(),
            prompt: PromptDescriptor::ChoiceList(vec![
                ChoiceItem { label: "Yes".into() },
                ChoiceItem { label: "No".into() },
            ]),
        })
        .await;

    let report = processed(harness.send("hi").await.unwrap());

    assert_eq!(report.sent, 1);
    assert_eq!(harness.channel.sent_texts().await, vec!["▶️ Yes\n▶️ No"]);
}

#[tokio::test]
async fn failed_start_leaves_conversation_reusable() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.set_fail_start(true);

    let report = processed(harness.send("hi").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Failed);
    assert_eq!(report.sent, 0);
    assert_eq!(harness.channel.sent_count().await, 0);
    assert!(harness.engine.continue_calls().await.is_empty());
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.session_id, None);
    assert!(conversation.automation_active);

    harness.engine.set_fail_start(false);
    harness.engine.push_texts(&["back online"]).await;
    let report = processed(harness.send("hi again").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Replied);
    assert_eq!(harness.engine.start_count().await, 2);
    assert_eq!(harness.channel.sent_texts().await, vec!["back online"]);
}

#[tokio::test]
async fn failed_continue_clears_session() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["hello"]).await;
    harness.send("hi").await.unwrap();

    harness.engine.push_failure("502 bad gateway").await;
    let report = processed(harness.send("are you there").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Failed);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.session_id, None);
    assert_eq!(harness.channel.sent_texts().await, vec!["hello"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_first_messages_start_one_session() {
    let harness = TestHarness::builder()
        .with_engine(MockFlowEngine::new().with_start_delay(Duration::from_millis(50)))
        .build()
        .await
        .unwrap();

    let first = harness.service.handle_inbound(TestHarness::inbound("one"));
    let second = harness.service.handle_inbound(TestHarness::inbound("two"));
    let (a, b) = tokio::join!(first, second);
    a.unwrap();
    b.unwrap();

    assert_eq!(harness.engine.start_count().await, 1);
    let calls = harness.engine.continue_calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, calls[1].0);
    assert_eq!(harness.service.active_conversations(), 0);
}

#[tokio::test]
async fn different_conversations_get_their_own_sessions() {
    let harness = TestHarness::builder().build().await.unwrap();

    harness
        .service
        .handle_inbound(TestHarness::inbound_from("111@s.whatsapp.net", "hi"))
        .await
        .unwrap();
    harness
        .service
        .handle_inbound(TestHarness::inbound_from("222@s.whatsapp.net", "hi"))
        .await
        .unwrap();

    let calls = harness.engine.continue_calls().await;
    assert_ne!(calls[0].0, calls[1].0);
    assert_eq!(
        harness.storage.list_conversations(None).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn idle_session_expires_and_restarts() {
    let mut integration = default_integration();
    integration.session_expiry_minutes = 5;
    let harness = TestHarness::builder()
        .with_integration(integration)
        .build()
        .await
        .unwrap();

    harness.send("hi").await.unwrap();
    let mut conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    conversation.last_activity_at = chrono::Utc::now() - chrono::TimeDelta::minutes(10);
    harness.storage.update_conversation(&conversation).await.unwrap();

    harness.send("back after a while").await.unwrap();

    assert_eq!(harness.engine.start_count().await, 2);
    let calls = harness.engine.continue_calls().await;
    assert_eq!(calls[1].0, FlowSessionId("mock-session-2".into()));
}

#[tokio::test]
async fn recent_session_is_kept() {
    let mut integration = default_integration();
    integration.session_expiry_minutes = 5;
    let harness = TestHarness::builder()
        .with_integration(integration)
        .build()
        .await
        .unwrap();

    harness.send("hi").await.unwrap();
    harness.send("still here").await.unwrap();

    assert_eq!(harness.engine.start_count().await, 1);
}

#[tokio::test]
async fn expiry_rearms_automation_after_handoff() {
    let mut integration = default_integration();
    integration.session_expiry_minutes = 5;
    let harness = TestHarness::builder()
        .with_integration(integration)
        .build()
        .await
        .unwrap();
    harness.engine.push_texts(&[r##"#{"stopBot":true}"##]).await;
    harness.send("hi").await.unwrap();

    let mut conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(!conversation.automation_active);
    conversation.last_activity_at = chrono::Utc::now() - chrono::TimeDelta::hours(1);
    harness.storage.update_conversation(&conversation).await.unwrap();

    let report = processed(harness.send("hello?").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Replied);
    assert_eq!(harness.engine.start_count().await, 2);
}

#[tokio::test]
async fn directive_short_circuits_batch_and_prompt() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .engine
        .push_reply(FlowReply {
            units: vec![
                text_unit("Transferring you"),
                text_unit(r##"#{"queueId":3}"##),
                text_unit("never sent"),
            ],
            prompt: PromptDescriptor::ChoiceList(vec![ChoiceItem { label: "Ok".into() }]),
        })
        .await;

    let report = processed(harness.send("human").await.unwrap());

    assert_eq!(report.sent, 1);
    assert_eq!(harness.channel.sent_texts().await, vec!["Transferring you"]);
    assert_eq!(
        report.directive,
        Some(ControlDirective::ReleaseToHuman {
            queue_id: QueueId("3".into()),
            user_id: None,
        })
    );

    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.owner, OwnerAssignment::Queue(QueueId("3".into())));
    assert!(!conversation.automation_active);
    assert_eq!(conversation.session_id, None);

    let updates = harness.ticketing.updates().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].0.ticket_id, 7);
    assert_eq!(
        updates[1].1,
        TicketUpdate {
            queue_id: Some(QueueId("3".into())),
            automation_active: Some(false),
            integration_id: Some(None),
            ..TicketUpdate::default()
        }
    );
}

#[tokio::test]
async fn release_with_user_assigns_agent() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .engine
        .push_texts(&[r##"#{"queueId":"3","userId":"12"}"##])
        .await;

    harness.send("human").await.unwrap();

    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.owner, OwnerAssignment::Agent(UserId("12".into())));
    let updates = harness.ticketing.updates().await;
    assert_eq!(updates[1].1.user_id, Some(UserId("12".into())));
}

#[tokio::test]
async fn rejected_ticket_update_keeps_local_state() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.ticketing.set_fail(true);
    harness.engine.push_texts(&[r##"#{"queueId":3}"##]).await;

    let err = harness.send("human").await.unwrap_err();

    assert!(matches!(err, BridgeError::Ownership { .. }));
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Bot);
    assert!(conversation.session_id.is_some());
}

#[tokio::test]
async fn release_without_ticketing_is_local() {
    let harness = TestHarness::builder()
        .without_ticketing()
        .build()
        .await
        .unwrap();
    harness.engine.push_texts(&[r##"#{"queueId":3}"##]).await;

    harness.send("human").await.unwrap();

    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.owner, OwnerAssignment::Queue(QueueId("3".into())));
    assert!(harness.ticketing.updates().await.is_empty());
}

#[tokio::test]
async fn malformed_directive_is_delivered_as_text() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&[r##"#{"userId":4}"##, "after"]).await;

    let report = processed(harness.send("hi").await.unwrap());

    assert_eq!(report.directive, None);
    assert_eq!(
        harness.channel.sent_texts().await,
        vec![r##"#{"userId":4}"##, "after"]
    );
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
}

#[tokio::test]
async fn inactive_automation_skips_engine() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&[r##"#{"stopBot":true}"##]).await;
    harness.send("hi").await.unwrap();

    let report = processed(harness.send("anyone?").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Inactive);
    assert_eq!(harness.engine.continue_calls().await.len(), 1);
    assert_eq!(harness.channel.sent_count().await, 0);
}

#[tokio::test]
async fn restart_keyword_survives_engine_failure() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["hello"]).await;
    harness.send("hi").await.unwrap();
    harness.engine.push_failure("engine down").await;

    let report = processed(harness.send("restart").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Failed);
    assert_eq!(report.keywords, vec![KeywordAction::Restart]);
    assert_eq!(
        harness.channel.sent_texts().await,
        vec!["hello", "Conversation restarted."]
    );
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Bot);
    assert_eq!(conversation.session_id, None);
}

#[tokio::test]
async fn restart_keyword_runs_after_rejected_release() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["hello"]).await;
    harness.send("hi").await.unwrap();
    harness.ticketing.set_fail(true);
    harness.engine.push_texts(&[r##"#{"queueId":3}"##]).await;

    let err = harness.send("restart").await.unwrap_err();

    assert!(matches!(err, BridgeError::Ownership { .. }));
    assert_eq!(
        harness.channel.sent_texts().await,
        vec!["hello", "Conversation restarted."]
    );
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Bot);
    assert_eq!(conversation.session_id, None);
}

#[tokio::test]
async fn restart_keyword_rearms_stopped_conversation() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&[r##"#{"stopBot":true}"##]).await;
    harness.send("hi").await.unwrap();

    let report = processed(harness.send("restart").await.unwrap());

    assert_eq!(report.engine, EngineStatus::Inactive);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Bot);

    harness.send("new start").await.unwrap();
    assert_eq!(harness.engine.start_count().await, 2);
}

#[tokio::test]
async fn finish_keyword_closes_and_next_message_reopens() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["hello"]).await;
    harness.send("hi").await.unwrap();
    harness.engine.push_texts(&["bye"]).await;

    let report = processed(harness.send("finish").await.unwrap());

    assert_eq!(report.keywords, vec![KeywordAction::Finish]);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Closed);
    assert!(!conversation.automation_active);
    assert_eq!(conversation.owner, OwnerAssignment::Unassigned);
    let updates = harness.ticketing.updates().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].1.status, Some(ConversationStatus::Closed));
    assert_eq!(updates[1].1.integration_id, Some(None));

    harness.engine.push_texts(&["welcome back"]).await;
    harness.send("hello again").await.unwrap();

    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.status, ConversationStatus::Open);
    assert!(conversation.automation_active);
    assert_eq!(harness.engine.start_count().await, 2);
}

#[tokio::test]
async fn empty_reply_sends_fallback_when_enabled() {
    let harness = TestHarness::builder().build().await.unwrap();

    harness.send("gibberish").await.unwrap();

    assert_eq!(
        harness.channel.sent_texts().await,
        vec![default_integration().unknown_reply_text]
    );
}

#[tokio::test]
async fn empty_reply_is_silent_when_fallback_disabled() {
    let mut integration = default_integration();
    integration.fallback_on_empty = false;
    let harness = TestHarness::builder()
        .with_integration(integration)
        .build()
        .await
        .unwrap();

    harness.send("gibberish").await.unwrap();

    assert_eq!(harness.channel.sent_count().await, 0);
}

#[tokio::test]
async fn send_failure_abandons_rest_of_batch() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.channel.set_fail_sends(true);
    harness.engine.push_texts(&["a", "b"]).await;

    let report = processed(harness.send("hi").await.unwrap());

    assert!(report.abandoned);
    assert_eq!(report.sent, 0);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert!(conversation.session_id.is_some());
}

#[tokio::test]
async fn broadcast_is_ignored() {
    let harness = TestHarness::builder().build().await.unwrap();

    let outcome = harness
        .service
        .handle_inbound(TestHarness::inbound_from("status@broadcast", "story"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Ignored(IgnoreReason::Broadcast)
    ));
    assert!(harness.storage.list_conversations(None).await.unwrap().is_empty());
    assert_eq!(harness.engine.start_count().await, 0);
}

fn second_integration() -> IntegrationConfig {
    let mut config = IntegrationConfig::new("sales", "http://typebot.invalid", "sales-flow");
    config.message_delay_ms = 0;
    config
}

#[tokio::test]
async fn ambiguous_or_unknown_integration_is_ignored() {
    let harness = TestHarness::builder()
        .with_integration(default_integration())
        .with_integration(second_integration())
        .build()
        .await
        .unwrap();

    let outcome = harness.send("hi").await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Ignored(IgnoreReason::UnknownIntegration)
    ));

    let mut msg = TestHarness::inbound("hi");
    msg.integration = Some("billing".into());
    let outcome = harness.service.handle_inbound(msg).await.unwrap();
    assert!(matches!(
        outcome,
        TurnOutcome::Ignored(IgnoreReason::UnknownIntegration)
    ));
}

#[tokio::test]
async fn integration_change_clears_session() {
    let harness = TestHarness::builder()
        .with_integration(default_integration())
        .with_integration(second_integration())
        .build()
        .await
        .unwrap();

    let mut msg = TestHarness::inbound("hi");
    msg.integration = Some("support".into());
    harness.service.handle_inbound(msg).await.unwrap();

    let mut msg = TestHarness::inbound("pricing");
    msg.integration = Some("sales".into());
    harness.service.handle_inbound(msg).await.unwrap();

    assert_eq!(harness.engine.start_count().await, 2);
    let conversation = harness.conversation(TEST_SENDER).await.unwrap().unwrap();
    assert_eq!(conversation.integration, "sales");
    assert_eq!(
        conversation.session_id,
        Some(FlowSessionId("mock-session-2".into()))
    );
}

#[tokio::test]
async fn bridge_loop_processes_until_channel_closes() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.engine.push_texts(&["one"]).await;
    harness.engine.push_texts(&["two"]).await;
    harness
        .channel
        .inject_message(TestHarness::inbound_from("111@s.whatsapp.net", "hi"))
        .await;
    harness
        .channel
        .inject_message(TestHarness::inbound_from("222@s.whatsapp.net", "hi"))
        .await;
    harness.channel.close();

    let bridge = BridgeLoop::new(Arc::clone(&harness.service), Duration::from_secs(5));
    bridge.run(CancellationToken::new()).await.unwrap();

    assert_eq!(harness.engine.continue_calls().await.len(), 2);
    assert_eq!(harness.channel.sent_count().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bridge_loop_keeps_message_order_per_conversation() {
    let harness = TestHarness::builder().build().await.unwrap();
    let bodies: Vec<String> = (0..12).map(|i| format!("m{i}")).collect();
    for body in &bodies {
        harness
            .channel
            .inject_message(TestHarness::inbound(body))
            .await;
    }
    harness
        .channel
        .inject_message(TestHarness::inbound_from("222@s.whatsapp.net", "other"))
        .await;
    harness.channel.close();

    let bridge = BridgeLoop::new(Arc::clone(&harness.service), Duration::from_secs(5));
    bridge.run(CancellationToken::new()).await.unwrap();

    let calls = harness.engine.continue_calls().await;
    assert_eq!(calls.len(), 13);
    let session = calls
        .iter()
        .find(|(_, body)| body == "m0")
        .map(|(session, _)| session.clone())
        .expect("m0 should reach the engine");
    let received: Vec<String> = calls
        .into_iter()
        .filter(|(s, _)| *s == session)
        .map(|(_, body)| body)
        .collect();
    assert_eq!(received, bodies);
    assert_eq!(harness.engine.start_count().await, 2);
    assert_eq!(harness.service.active_conversations(), 0);
}

#[tokio::test]
async fn bridge_loop_stops_on_cancel() {
    let harness = TestHarness::builder().build().await.unwrap();
    let bridge = BridgeLoop::new(Arc::clone(&harness.service), Duration::from_secs(1));
    let cancel = CancellationToken::new();

    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.run(cancel).await })
    };
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop")
        .expect("loop task should not panic");
    assert!(result.is_ok());
}
