//! Account settings tool.

use super::{parse_arguments, Tool, ToolOutput};
use crate::accounts::AccountStore;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct AccountArgs {
    user_id: String,
    action: String,
    #[serde(default)]
    new_plan: Option<String>,
}

/// Reads or changes a customer's subscription plan.
pub struct AccountSettingsTool {
    store: Arc<AccountStore>,
}

impl AccountSettingsTool {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AccountSettingsTool {
    fn name(&self) -> &str {
        "update_account_settings"
    }

    fn description(&self) -> &str {
        "Use to read or update account settings, like subscription plans. \
         Requires 'user_id' and 'action' ('read' or 'write'). \
         If action is 'write', also provide 'new_plan'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "The customer's user ID, e.g. user123"
                },
                "action": {
                    "type": "string",
                    "enum": ["read", "write"],
                    "description": "'read' to look up the plan, 'write' to change it"
                },
                "new_plan": {
                    "type": "string",
                    "enum": ["Basic", "Pro", "Enterprise"],
                    "description": "The plan to switch to (required for 'write')"
                }
            },
            "required": ["user_id", "action"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolOutput> {
        let args: AccountArgs = parse_arguments(self.name(), arguments)?;
        info!(
            user_id = %args.user_id,
            action = %args.action,
            new_plan = ?args.new_plan,
            "Account settings requested"
        );

        let outcome = self
            .store
            .read_or_write_account(&args.user_id, &args.action, args.new_plan.as_deref())
            .await;

        Ok(ToolOutput::text(outcome.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Plan;

    #[tokio::test]
    async fn test_write_through_tool() {
        let store = Arc::new(AccountStore::seeded());
        let tool = AccountSettingsTool::new(store.clone());

        let output = tool
            .invoke(json!({"user_id": "user123", "action": "write", "new_plan": "Pro"}))
            .await
            .unwrap();
        assert_eq!(output.text, "Success: User 'user123' plan updated to 'Pro'.");
        assert_eq!(store.get("user123").await.unwrap().plan, Plan::Pro);
    }

    #[tokio::test]
    async fn test_user_errors_are_results() {
        let tool = AccountSettingsTool::new(Arc::new(AccountStore::seeded()));

        let missing = tool
            .invoke(json!({"user_id": "user123", "action": "write"}))
            .await
            .unwrap();
        assert!(missing.text.contains("'new_plan' is required"));

        let null_plan = tool
            .invoke(json!({"user_id": "user123", "action": "write", "new_plan": null}))
            .await
            .unwrap();
        assert_eq!(null_plan.text, missing.text);

        let unknown = tool
            .invoke(json!({"user_id": "nobody", "action": "read"}))
            .await
            .unwrap();
        assert!(unknown.text.starts_with("Error: User with ID 'nobody'"));
    }

    #[tokio::test]
    async fn test_missing_user_id_is_parse_error() {
        let tool = AccountSettingsTool::new(Arc::new(AccountStore::seeded()));
        assert!(tool.invoke(json!({"action": "read"})).await.is_err());
    }
}
