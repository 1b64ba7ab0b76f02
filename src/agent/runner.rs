//! Agent runner with the tool calling loop.

use super::model::{ChatModel, ContextMessage, ModelReply};
use super::state::{LoopEvent, LoopState};
use crate::error::{ResolvError, Result};
use crate::session::{ConversationTurn, Role};
use crate::tools::ToolRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default cap on tool round trips per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Output of a turn that ran out of round trips.
pub const COULD_NOT_COMPLETE: &str = "I'm sorry, I could not complete your request. \
     Please try rephrasing it, or ask me to escalate the issue to a human agent.";

/// Support agent: a model, a tool registry and a system prompt.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, system_prompt: &str) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum tool round trips for the loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run one user turn on top of `history`.
    ///
    /// Exhausting the round-trip budget is not an error: the outcome is
    /// `Failed` with [`COULD_NOT_COMPLETE`] as output. Model and transport
    /// failures propagate.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn run_turn(&self, history: &[ConversationTurn], input: &str) -> Result<TurnOutcome> {
        let mut context = Vec::with_capacity(history.len() + 2);
        context.push(ContextMessage::System(self.system_prompt.clone()));
        context.extend(history.iter().map(|turn| match turn.role {
            Role::User => ContextMessage::User(turn.text.clone()),
            Role::Assistant => ContextMessage::Assistant(turn.text.clone()),
        }));
        context.push(ContextMessage::User(input.to_string()));

        let specs = self.tools.specs();
        let mut state = LoopState::AwaitingModel;
        let mut tool_calls = Vec::new();
        let mut rounds = 0;
        let mut model_calls = 0;
        let mut escalated = false;

        let output = loop {
            if rounds >= self.max_iterations {
                warn!("Agent exceeded maximum iterations ({})", self.max_iterations);
                state = state.transition(LoopEvent::BudgetExhausted)?;
                break COULD_NOT_COMPLETE.to_string();
            }

            model_calls += 1;
            debug!("Agent iteration {}", model_calls);

            match self.model.predict(&context, &specs).await? {
                ModelReply::Final(answer) if answer.trim().is_empty() => {
                    warn!("Model returned an empty answer");
                    state = state.transition(LoopEvent::EmptyAnswer)?;
                    break COULD_NOT_COMPLETE.to_string();
                }
                ModelReply::Final(answer) => {
                    state = state.transition(LoopEvent::FinalAnswer)?;
                    break answer;
                }
                ModelReply::ToolCalls(requests) => {
                    state = state.transition(LoopEvent::ToolRequested)?;
                    rounds += 1;
                    context.push(ContextMessage::AssistantToolCalls(requests.clone()));

                    for request in requests {
                        info!("Agent calling tool: {} with args: {}", request.name, request.arguments);

                        let result = match self.tools.dispatch(&request.name, &request.arguments).await {
                            Ok(output) => {
                                escalated |= output.escalated;
                                output.text
                            }
                            Err(ResolvError::InvalidToolArguments { tool, reason }) => {
                                warn!("Unparseable call to {}: {}", tool, reason);
                                retry_observation(&tool, &reason)
                            }
                            Err(e) => return Err(e),
                        };

                        context.push(ContextMessage::Tool {
                            call_id: request.id.clone(),
                            content: result.clone(),
                        });
                        tool_calls.push(ToolInvocation {
                            name: request.name,
                            arguments: request.arguments,
                            result,
                        });
                    }

                    state = state.transition(LoopEvent::ToolFinished)?;
                }
            }
        };

        info!(
            state = %state,
            model_calls,
            tool_calls = tool_calls.len(),
            escalated,
            "Turn finished"
        );

        Ok(TurnOutcome {
            output,
            state,
            tool_calls,
            iterations: model_calls,
            escalated,
        })
    }
}

fn retry_observation(tool: &str, reason: &str) -> String {
    format!(
        "Error: your request to '{}' could not be parsed ({}). Please retry with valid arguments.",
        tool, reason
    )
}

/// Result of one user turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Final answer, or the fallback message when the turn failed.
    pub output: String,
    /// `Done` or `Failed`.
    pub state: LoopState,
    pub tool_calls: Vec<ToolInvocation>,
    /// Model calls made.
    pub iterations: usize,
    /// An escalation was recorded during the turn.
    pub escalated: bool,
}

impl TurnOutcome {
    pub fn is_done(&self) -> bool {
        self.state == LoopState::Done
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    pub result: String,
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::{strip_reasoning, ToolRequest};
    use crate::tools::ToolSpec;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies and remembers each context it saw.
    struct Scripted {
        replies: Mutex<Vec<ModelReply>>,
        seen: Mutex<Vec<Vec<ContextMessage>>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<ModelReply>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for Scripted {
        async fn predict(&self, context: &[ContextMessage], _tools: &[ToolSpec]) -> Result<ModelReply> {
            self.seen.lock().unwrap().push(context.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ResolvError::Agent("script exhausted".to_string()))
        }
    }

    fn call(name: &str, args: &str) -> ModelReply {
        ModelReply::ToolCalls(vec![ToolRequest {
            id: format!("call_{}", name),
            name: name.to_string(),
            arguments: args.to_string(),
        }])
    }

    #[test]
    fn test_tool_invocation_display() {
        let record = ToolInvocation {
            name: "knowledge_base_retriever".to_string(),
            arguments: r#"{"query": "reset"}"#.to_string(),
            result: "Click Forgot password".to_string(),
        };
        assert_eq!(
            format!("{}", record),
            r#"knowledge_base_retriever({"query": "reset"})"#
        );
    }

    #[tokio::test]
    async fn test_final_answer_without_tools() {
        let model = Arc::new(Scripted::new(vec![ModelReply::Final("Hi there".to_string())]));
        let agent = Agent::new(model.clone(), ToolRegistry::new(), "sys");

        let history = vec![ConversationTurn::assistant("Hello!")];
        let outcome = agent.run_turn(&history, "hello").await.unwrap();

        assert!(outcome.is_done());
        assert_eq!(outcome.output, "Hi there");
        assert_eq!(outcome.iterations, 1);

        let seen = model.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            vec![
                ContextMessage::System("sys".to_string()),
                ContextMessage::Assistant("Hello!".to_string()),
                ContextMessage::User("hello".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let model = Arc::new(Scripted::new(vec![
            call("refund_everything", "{}"),
            ModelReply::Final("Sorry".to_string()),
        ]));
        let agent = Agent::new(model.clone(), ToolRegistry::new(), "sys");

        let outcome = agent.run_turn(&[], "refund me").await.unwrap();
        assert_eq!(outcome.state, LoopState::Done);
        assert!(outcome.tool_calls[0].result.contains("could not be parsed"));

        let seen = model.seen.lock().unwrap();
        assert!(matches!(
            seen[1].last(),
            Some(ContextMessage::Tool { content, .. }) if content.contains("Please retry")
        ));
    }

    #[tokio::test]
    async fn test_budget_zero_fails_without_model_call() {
        let model = Arc::new(Scripted::new(Vec::new()));
        let agent = Agent::new(model.clone(), ToolRegistry::new(), "sys").with_max_iterations(0);

        let outcome = agent.run_turn(&[], "anything").await.unwrap();
        assert_eq!(outcome.state, LoopState::Failed);
        assert_eq!(outcome.output, COULD_NOT_COMPLETE);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_answer_falls_back() {
        let model = Arc::new(Scripted::new(vec![ModelReply::Final(strip_reasoning(
            "<think>the user wants a refund</think>",
        ))]));
        let agent = Agent::new(model, ToolRegistry::new(), "sys");

        let outcome = agent.run_turn(&[], "refund me").await.unwrap();
        assert_eq!(outcome.state, LoopState::Failed);
        assert_eq!(outcome.output, COULD_NOT_COMPLETE);
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(Scripted::new(Vec::new()));
        let agent = Agent::new(model, ToolRegistry::new(), "sys");
        assert!(agent.run_turn(&[], "hello").await.is_err());
    }
}
