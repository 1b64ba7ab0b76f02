//! Human escalation tool.

use super::{parse_arguments, Tool, ToolOutput};
use crate::activity::{Activity, ActivityLog, Escalation};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct EscalateArgs {
    summary: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Logs an escalation and marks the turn as handed off.
pub struct EscalateTool {
    activity: Arc<ActivityLog>,
}

impl EscalateTool {
    pub fn new(activity: Arc<ActivityLog>) -> Self {
        Self { activity }
    }

    /// Record one escalation and return its confirmation.
    pub async fn escalate(&self, summary: &str, reason: Option<&str>) -> ToolOutput {
        let escalation = Escalation::new(summary, reason);
        let ticket_id = escalation.ticket_id;
        self.activity.record(Activity::Escalation(escalation)).await;
        ToolOutput::escalation(format!(
            "Success: Ticket {} escalated for human review.",
            ticket_id
        ))
    }
}

#[async_trait]
impl Tool for EscalateTool {
    fn name(&self) -> &str {
        "escalate_ticket"
    }

    fn description(&self) -> &str {
        "Use ONLY when an issue cannot be resolved by other tools. \
         This hands the ticket to a human. Input must be a clear summary of the problem."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "Clear summary of the unresolved problem"
                },
                "reason": {
                    "type": "string",
                    "description": "Why the other tools could not resolve it"
                }
            },
            "required": ["summary"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolOutput> {
        let args: EscalateArgs = parse_arguments(self.name(), arguments)?;
        Ok(self.escalate(&args.summary, args.reason.as_deref()).await)
    }
}
