//! Email draft tool.

use super::{parse_arguments, Tool, ToolOutput};
use crate::activity::{Activity, ActivityLog, EmailDraft};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DraftArgs {
    recipient_email: String,
    message_body: String,
}

/// Formats a reply and records it. Nothing is sent.
pub struct DraftReplyTool {
    activity: Arc<ActivityLog>,
}

impl DraftReplyTool {
    pub fn new(activity: Arc<ActivityLog>) -> Self {
        Self { activity }
    }

    /// Draft a reply to `recipient` and return the rendered draft.
    pub async fn draft_reply(&self, recipient: &str, body: &str) -> String {
        let draft = EmailDraft::new(recipient, body);
        let rendered = draft.render();
        self.activity.record(Activity::EmailDraft(draft)).await;
        format!("Success: The reply has been drafted.\n\n{}", rendered)
    }
}

#[async_trait]
impl Tool for DraftReplyTool {
    fn name(&self) -> &str {
        "draft_reply"
    }

    fn description(&self) -> &str {
        "Use to draft an email reply to a customer after resolving an issue."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipient_email": {
                    "type": "string",
                    "description": "Customer email address"
                },
                "message_body": {
                    "type": "string",
                    "description": "Body of the reply"
                }
            },
            "required": ["recipient_email", "message_body"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolOutput> {
        let args: DraftArgs = parse_arguments(self.name(), arguments)?;
        Ok(ToolOutput::text(
            self.draft_reply(&args.recipient_email, &args.message_body)
                .await,
        ))
    }
}
