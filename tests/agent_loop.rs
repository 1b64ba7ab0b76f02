//! End-to-end turns through the orchestrator with scripted models.

use async_trait::async_trait;
use resolv::accounts::Plan;
use resolv::agent::{ChatModel, ContextMessage, LoopState, ModelReply, ToolRequest, COULD_NOT_COMPLETE};
use resolv::chunking::{ChunkingConfig, WindowChunker};
use resolv::config::{Prompts, Settings};
use resolv::documents::Page;
use resolv::embedding::HashingEmbedder;
use resolv::index::EmbeddingIndex;
use resolv::orchestrator::Orchestrator;
use resolv::session::{ConversationTurn, Session};
use resolv::tools::{ToolSpec, NO_RELEVANT_INFORMATION};
use resolv::Result;
use std::sync::{Arc, Mutex};

/// Replays replies in order and records every context it was given.
struct ScriptedModel {
    replies: Mutex<Vec<ModelReply>>,
    contexts: Mutex<Vec<Vec<ContextMessage>>>,
}

impl ScriptedModel {
    fn new(replies: Vec<ModelReply>) -> Arc<Self> {
        let mut replies = replies;
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    fn context(&self, i: usize) -> Vec<ContextMessage> {
        self.contexts.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn predict(&self, context: &[ContextMessage], _tools: &[ToolSpec]) -> Result<ModelReply> {
        self.contexts.lock().unwrap().push(context.to_vec());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| ModelReply::Final("(script exhausted)".to_string())))
    }
}

/// Asks for the same tool forever.
struct LoopingModel {
    calls: Mutex<usize>,
}

#[async_trait]
impl ChatModel for LoopingModel {
    async fn predict(&self, _context: &[ContextMessage], _tools: &[ToolSpec]) -> Result<ModelReply> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(tool_call(
            &format!("call_{}", *calls),
            "knowledge_base_retriever",
            r#"{"query": "refunds"}"#,
        ))
    }
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ModelReply {
    ModelReply::ToolCalls(vec![ToolRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }])
}

fn last_observation(context: &[ContextMessage]) -> String {
    match context.last() {
        Some(ContextMessage::Tool { content, .. }) => content.clone(),
        other => panic!("expected a tool observation, got {:?}", other),
    }
}

async fn knowledge_index() -> Arc<EmbeddingIndex> {
    let pages = vec![
        Page::new(
            "support.pdf",
            1,
            "Password resets: click 'Forgot password' on the login page and follow the link \
             sent to your email address.",
        ),
        Page::new(
            "support.pdf",
            2,
            "Billing: invoices are generated on the first day of each month and can be \
             downloaded from the billing dashboard.",
        ),
    ];
    let chunks = WindowChunker::new(ChunkingConfig::default()).chunk_pages(&pages);
    Arc::new(
        EmbeddingIndex::build(chunks, Arc::new(HashingEmbedder::default()))
            .await
            .unwrap(),
    )
}

fn orchestrator(model: Arc<dyn ChatModel>, index: Option<Arc<EmbeddingIndex>>) -> Orchestrator {
    Orchestrator::with_components(Settings::default(), Prompts::default(), model, index)
}

#[tokio::test]
async fn test_budget_exhaustion_fails_without_sixth_call() {
    let model = Arc::new(LoopingModel {
        calls: Mutex::new(0),
    });
    let orchestrator = orchestrator(model.clone(), Some(knowledge_index().await));
    let mut session = Session::new();

    let outcome = orchestrator
        .respond(&mut session, "What is the refund policy?")
        .await
        .unwrap();

    assert_eq!(outcome.state, LoopState::Failed);
    assert_eq!(outcome.output, COULD_NOT_COMPLETE);
    assert_eq!(*model.calls.lock().unwrap(), 5);
    assert_eq!(outcome.iterations, 5);
    assert_eq!(outcome.tool_calls.len(), 5);

    // The failed turn is still part of the conversation.
    assert_eq!(
        session.turns(),
        &[
            ConversationTurn::user("What is the refund policy?"),
            ConversationTurn::assistant(COULD_NOT_COMPLETE),
        ]
    );
}

#[tokio::test]
async fn test_retrieval_then_answer() {
    let model = ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "knowledge_base_retriever",
            r#"{"query": "How do I reset my password?"}"#,
        ),
        ModelReply::Final("Click 'Forgot password' on the login page.".to_string()),
    ]);
    let orchestrator = orchestrator(model.clone(), Some(knowledge_index().await));
    let mut session = orchestrator.new_session();

    let outcome = orchestrator
        .respond(&mut session, "How do I reset my password?")
        .await
        .unwrap();

    assert_eq!(outcome.state, LoopState::Done);
    assert_eq!(model.calls(), 2);
    assert!(last_observation(&model.context(1)).contains("Forgot password"));
    assert_eq!(session.len(), 3);
}

#[tokio::test]
async fn test_empty_knowledge_base_reports_no_information() {
    let model = ScriptedModel::new(vec![
        tool_call("call_1", "knowledge_base_retriever", r#"{"query": "vpn setup"}"#),
        ModelReply::Final("I could not find that.".to_string()),
    ]);
    let empty = Arc::new(
        EmbeddingIndex::build(Vec::new(), Arc::new(HashingEmbedder::default()))
            .await
            .unwrap(),
    );
    let orchestrator = orchestrator(model.clone(), Some(empty));

    orchestrator
        .respond(&mut Session::new(), "How do I set up the VPN?")
        .await
        .unwrap();
    assert_eq!(last_observation(&model.context(1)), NO_RELEVANT_INFORMATION);
}

#[tokio::test]
async fn test_malformed_calls_are_retried() {
    let model = ScriptedModel::new(vec![
        tool_call("call_1", "update_account_settings", "{not json"),
        tool_call("call_2", "cancel_subscription", r#"{"user_id": "user123"}"#),
        tool_call("call_3", "update_account_settings", r#"{"action": "read"}"#),
        tool_call(
            "call_4",
            "update_account_settings",
            r#"{"user_id": "user123", "action": "read"}"#,
        ),
        ModelReply::Final("You are on the Basic plan.".to_string()),
    ]);
    let orchestrator = orchestrator(model.clone(), None);

    let outcome = orchestrator
        .respond(&mut Session::new(), "Which plan am I on? I'm user123.")
        .await
        .unwrap();

    assert_eq!(outcome.state, LoopState::Done);
    for i in 1..=3 {
        assert!(last_observation(&model.context(i)).contains("Please retry"));
    }
    assert!(last_observation(&model.context(4)).contains("'Basic'"));
}

#[tokio::test]
async fn test_plan_change_through_agent() {
    let model = ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "update_account_settings",
            r#"{"user_id": "user123", "action": "write", "new_plan": "Enterprise"}"#,
        ),
        ModelReply::Final("Done, you are now on Enterprise.".to_string()),
        tool_call(
            "call_2",
            "update_account_settings",
            r#"{"user_id": "user123", "action": "write", "new_plan": "Gold"}"#,
        ),
        ModelReply::Final("Gold is not a plan we offer.".to_string()),
    ]);
    let orchestrator = orchestrator(model.clone(), None);
    let mut session = Session::new();

    orchestrator
        .respond(&mut session, "Upgrade user123 to Enterprise")
        .await
        .unwrap();
    orchestrator
        .respond(&mut session, "Actually make it Gold")
        .await
        .unwrap();

    assert!(last_observation(&model.context(3)).starts_with("Error: Invalid plan 'Gold'"));
    let record = orchestrator.accounts().get("user123").await.unwrap();
    assert_eq!(record.plan, Plan::Enterprise);
}

#[tokio::test]
async fn test_escalation_is_flagged_and_logged_once() {
    let model = ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "escalate_ticket",
            r#"{"summary": "User user456 is missing an invoice for August."}"#,
        ),
        ModelReply::Final("I've passed this to a human agent.".to_string()),
    ]);
    let orchestrator = orchestrator(model, None);

    let outcome = orchestrator
        .respond(&mut Session::new(), "My August invoice is missing")
        .await
        .unwrap();

    assert!(outcome.escalated);
    let escalations = orchestrator.activity().escalations().await;
    assert_eq!(escalations.len(), 1);
    assert!(outcome.tool_calls[0]
        .result
        .contains(&escalations[0].ticket_id.to_string()));
}

#[tokio::test]
async fn test_draft_reply_is_not_an_escalation() {
    let model = ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "draft_reply",
            r#"{"recipient_email": "alice@example.com", "message_body": "Your plan is now Pro."}"#,
        ),
        ModelReply::Final("I've drafted a reply.".to_string()),
    ]);
    let orchestrator = orchestrator(model, None);

    let outcome = orchestrator
        .respond(&mut Session::new(), "Email Alice about her new plan")
        .await
        .unwrap();

    assert!(!outcome.escalated);
    assert!(outcome.tool_calls[0].result.contains("--- EMAIL DRAFT ---"));
    assert_eq!(orchestrator.activity().drafts().await.len(), 1);
}

#[tokio::test]
async fn test_cleared_history_is_not_sent() {
    let model = ScriptedModel::new(vec![
        ModelReply::Final("Hi Alice.".to_string()),
        ModelReply::Final("Hello!".to_string()),
    ]);
    let orchestrator = orchestrator(model.clone(), None);
    let mut session = Session::new();

    orchestrator.respond(&mut session, "I'm Alice").await.unwrap();
    session.clear();
    orchestrator.respond(&mut session, "Who am I?").await.unwrap();

    let second = model.context(1);
    assert_eq!(second.len(), 2);
    assert!(matches!(&second[0], ContextMessage::System(_)));
    assert_eq!(second[1], ContextMessage::User("Who am I?".to_string()));
}

#[tokio::test]
async fn test_history_carries_across_turns() {
    let model = ScriptedModel::new(vec![
        ModelReply::Final("Hi Alice.".to_string()),
        ModelReply::Final("You are Alice.".to_string()),
    ]);
    let orchestrator = orchestrator(model.clone(), None);
    let mut session = orchestrator.new_session();

    orchestrator.respond(&mut session, "I'm Alice").await.unwrap();
    orchestrator.respond(&mut session, "Who am I?").await.unwrap();

    let second = model.context(1);
    // system, greeting, user, assistant, user
    assert_eq!(second.len(), 5);
    assert_eq!(second[3], ContextMessage::Assistant("Hi Alice.".to_string()));
}
