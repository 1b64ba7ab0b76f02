//! Mock account table.
//!
//! An in-memory table of customer records keyed by user id. It is created
//! from seed records at startup, injected into the account tool, and lost when
//! the process exits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Subscription plans a record may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    Basic,
    Pro,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Pro, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "Basic",
            Plan::Pro => "Pro",
            Plan::Enterprise => "Enterprise",
        }
    }

    /// `Basic, Pro, Enterprise`
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Plan::Basic),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub user_id: String,
    pub display_name: String,
    pub plan: Plan,
    #[serde(default)]
    pub invoices: Vec<String>,
}

impl AccountRecord {
    pub fn new(user_id: &str, display_name: &str, plan: Plan, invoices: &[&str]) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            plan,
            invoices: invoices.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Records the table starts with when none are configured.
pub fn default_accounts() -> Vec<AccountRecord> {
    vec![
        AccountRecord::new("user123", "Alice", Plan::Basic, &["inv_123", "inv_456"]),
        AccountRecord::new("user456", "Bob", Plan::Pro, &["inv_789"]),
    ]
}

/// Operation requested on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    Read,
    Write,
}

impl std::str::FromStr for AccountAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(AccountAction::Read),
            "write" => Ok(AccountAction::Write),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// Result of an account operation. Every variant renders to the text the model sees.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountOutcome {
    Current {
        user_id: String,
        display_name: String,
        plan: Plan,
        invoices: Vec<String>,
    },
    Updated {
        user_id: String,
        plan: Plan,
    },
    NotFound {
        user_id: String,
    },
    MissingPlan,
    InvalidPlan {
        requested: String,
    },
    InvalidAction {
        requested: String,
    },
}

impl AccountOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AccountOutcome::Current { .. } | AccountOutcome::Updated { .. })
    }

    /// Plan reported by a successful read or write.
    pub fn plan(&self) -> Option<Plan> {
        match self {
            AccountOutcome::Current { plan, .. } | AccountOutcome::Updated { plan, .. } => {
                Some(*plan)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountOutcome::Current {
                user_id,
                display_name,
                plan,
                invoices,
            } => {
                write!(
                    f,
                    "Success: User '{}' ({}) is on the '{}' plan.",
                    user_id, display_name, plan
                )?;
                if invoices.is_empty() {
                    write!(f, " No invoices on file.")
                } else {
                    write!(f, " Invoices: {}.", invoices.join(", "))
                }
            }
            AccountOutcome::Updated { user_id, plan } => {
                write!(f, "Success: User '{}' plan updated to '{}'.", user_id, plan)
            }
            AccountOutcome::NotFound { user_id } => {
                write!(f, "Error: User with ID '{}' not found.", user_id)
            }
            AccountOutcome::MissingPlan => {
                write!(f, "Error: 'new_plan' is required for a 'write' action.")
            }
            AccountOutcome::InvalidPlan { requested } => write!(
                f,
                "Error: Invalid plan '{}'. Must be one of {}.",
                requested,
                Plan::choices()
            ),
            AccountOutcome::InvalidAction { requested } => write!(
                f,
                "Error: Invalid action '{}'. Must be 'read' or 'write'.",
                requested
            ),
        }
    }
}

/// In-memory account table.
pub struct AccountStore {
    records: RwLock<HashMap<String, AccountRecord>>,
}

impl AccountStore {
    pub fn new(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.user_id.clone(), r))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Table holding [`default_accounts`].
    pub fn seeded() -> Self {
        Self::new(default_accounts())
    }

    pub async fn get(&self, user_id: &str) -> Option<AccountRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Read the plan of `user_id`, or overwrite it with `new_plan`.
    ///
    /// Validation failures come back as outcomes, never as errors, and leave
    /// the table untouched.
    pub async fn read_or_write_account(
        &self,
        user_id: &str,
        action: &str,
        new_plan: Option<&str>,
    ) -> AccountOutcome {
        let Ok(action) = action.parse::<AccountAction>() else {
            if !self.records.read().await.contains_key(user_id) {
                return AccountOutcome::NotFound {
                    user_id: user_id.to_string(),
                };
            }
            return AccountOutcome::InvalidAction {
                requested: action.to_string(),
            };
        };

        match action {
            AccountAction::Read => {
                let records = self.records.read().await;
                let Some(record) = records.get(user_id) else {
                    return AccountOutcome::NotFound {
                        user_id: user_id.to_string(),
                    };
                };
                AccountOutcome::Current {
                    user_id: record.user_id.clone(),
                    display_name: record.display_name.clone(),
                    plan: record.plan,
                    invoices: record.invoices.clone(),
                }
            }
            AccountAction::Write => {
                let mut records = self.records.write().await;
                let Some(record) = records.get_mut(user_id) else {
                    return AccountOutcome::NotFound {
                        user_id: user_id.to_string(),
                    };
                };

                let requested = match new_plan.map(str::trim) {
                    Some(plan) if !plan.is_empty() => plan,
                    _ => return AccountOutcome::MissingPlan,
                };

                let Ok(plan) = requested.parse::<Plan>() else {
                    return AccountOutcome::InvalidPlan {
                        requested: requested.to_string(),
                    };
                };

                info!(user_id, from = %record.plan, to = %plan, "Account plan changed");
                record.plan = plan;
                AccountOutcome::Updated {
                    user_id: record.user_id.clone(),
                    plan,
                }
            }
        }
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::seeded()
    }
}
