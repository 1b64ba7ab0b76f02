//! Per-turn loop state machine.
//!
//! Transitions:
//! - `AwaitingModel` → `ExecutingTool` on `ToolRequested`
//! - `AwaitingModel` → `Done` on `FinalAnswer`
//! - `ExecutingTool` → `AwaitingModel` on `ToolFinished`
//! - `AwaitingModel` → `Failed` on `EmptyAnswer`
//! - any non-terminal → `Failed` on `BudgetExhausted`
//!
//! `Done` and `Failed` are terminal; every other pair is rejected.

use crate::error::{ResolvError, Result};
use serde::Serialize;
use std::fmt;

/// Where a turn is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    AwaitingModel,
    ExecutingTool,
    Done,
    Failed,
}

/// What just happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    ToolRequested,
    FinalAnswer,
    ToolFinished,
    BudgetExhausted,
    /// The model answered with nothing usable.
    EmptyAnswer,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done | LoopState::Failed)
    }

    pub fn transition(&self, event: LoopEvent) -> Result<LoopState> {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self, event) {
            (AwaitingModel, ToolRequested) => ExecutingTool,
            (AwaitingModel, FinalAnswer) => Done,
            (ExecutingTool, ToolFinished) => AwaitingModel,
            (AwaitingModel | ExecutingTool, BudgetExhausted) => Failed,
            (AwaitingModel, EmptyAnswer) => Failed,
            (state, event) => {
                return Err(ResolvError::InvalidTransition {
                    from: state.to_string(),
                    event: format!("{:?}", event),
                })
            }
        };

        Ok(next)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::AwaitingModel => "AWAITING_MODEL",
            LoopState::ExecutingTool => "EXECUTING_TOOL",
            LoopState::Done => "DONE",
            LoopState::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}
