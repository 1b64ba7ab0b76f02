//! Activity sink for drafted emails and escalations.
//!
//! Nothing is sent anywhere. Each record is logged through `tracing` and kept
//! in memory so front ends can show what the agent produced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Subject line used on every draft.
pub const DRAFT_SUBJECT: &str = "Support Ticket Update";

/// An email reply prepared for a customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub drafted_at: DateTime<Utc>,
}

impl EmailDraft {
    pub fn new(recipient: &str, body: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: DRAFT_SUBJECT.to_string(),
            body: body.to_string(),
            drafted_at: Utc::now(),
        }
    }

    /// Plain-text rendering of the draft.
    pub fn render(&self) -> String {
        format!(
            "--- EMAIL DRAFT ---\nTO: {}\nSUBJECT: {}\n\nBODY:\n{}\n--- END OF DRAFT ---",
            self.recipient, self.subject, self.body
        )
    }
}

/// A ticket handed off to a human.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Escalation {
    pub ticket_id: Uuid,
    pub summary: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Escalation {
    pub fn new(summary: &str, reason: Option<&str>) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            summary: summary.to_string(),
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    /// Plain-text rendering of the escalation note.
    pub fn render(&self) -> String {
        let mut note = format!(
            "--- TICKET ESCALATION ---\nTICKET: {}\nSTATUS: Needs Human Review\n",
            self.ticket_id
        );
        if let Some(reason) = &self.reason {
            note.push_str(&format!("REASON: {}\n", reason));
        }
        note.push_str(&format!("SUMMARY: {}\n--- END OF LOG ---", self.summary));
        note
    }
}

/// One record in the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    EmailDraft(EmailDraft),
    Escalation(Escalation),
}

impl Activity {
    pub fn render(&self) -> String {
        match self {
            Activity::EmailDraft(draft) => draft.render(),
            Activity::Escalation(escalation) => escalation.render(),
        }
    }
}

/// Append-only log of agent side effects.
#[derive(Default)]
pub struct ActivityLog {
    records: RwLock<Vec<Activity>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and store a record.
    pub async fn record(&self, activity: Activity) {
        match &activity {
            Activity::EmailDraft(draft) => {
                info!(recipient = %draft.recipient, "Email drafted\n{}", draft.render());
            }
            Activity::Escalation(escalation) => {
                info!(ticket = %escalation.ticket_id, "Ticket escalated\n{}", escalation.render());
            }
        }
        self.records.write().await.push(activity);
    }

    /// All records, oldest first.
    pub async fn snapshot(&self) -> Vec<Activity> {
        self.records.read().await.clone()
    }

    pub async fn escalations(&self) -> Vec<Escalation> {
        self.records
            .read()
            .await
            .iter()
            .filter_map(|a| match a {
                Activity::Escalation(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn drafts(&self) -> Vec<EmailDraft> {
        self.records
            .read()
            .await
            .iter()
            .filter_map(|a| match a {
                Activity::EmailDraft(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
