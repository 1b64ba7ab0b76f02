//! Support agent with tool calling.
//!
//! Each user turn runs an explicit state machine: the model is asked for a
//! reply, requested tools are dispatched through the registry and their
//! results fed back, until the model answers or the round-trip budget runs out.

mod model;
mod runner;
mod state;

pub use model::{
    strip_reasoning, ChatModel, ContextMessage, ModelReply, OpenAIChatModel, ToolRequest,
};
pub use runner::{Agent, ToolInvocation, TurnOutcome, COULD_NOT_COMPLETE, DEFAULT_MAX_ITERATIONS};
pub use state::{LoopEvent, LoopState};
