//! Tools the support agent can call.
//!
//! Each tool has a name, a natural-language description and a JSON argument
//! schema that are advertised to the model, plus a handler. The registry looks
//! tools up by name; argument payloads are deserialized into typed structs so
//! a malformed call surfaces as [`ResolvError::InvalidToolArguments`].

mod account;
mod email;
mod escalation;
mod knowledge;

pub use account::AccountSettingsTool;
pub use email::DraftReplyTool;
pub use escalation::EscalateTool;
pub use knowledge::{KnowledgeRetrieverTool, NOT_INITIALIZED, NO_RELEVANT_INFORMATION};

use crate::accounts::AccountStore;
use crate::activity::ActivityLog;
use crate::error::{ResolvError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Text handed back to the model, plus loop signals.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    /// The ticket was handed off to a human.
    pub escalated: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            escalated: false,
        }
    }

    pub fn escalation(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            escalated: true,
        }
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool on an arguments object.
    async fn invoke(&self, arguments: Value) -> Result<ToolOutput>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize a tool's arguments, mapping failures to a parse error.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| ResolvError::InvalidToolArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Tools by name, in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `name` and run it on the raw JSON `arguments` string.
    ///
    /// Unknown names and unparseable JSON are reported as invalid arguments.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| ResolvError::InvalidToolArguments {
                tool: name.to_string(),
                reason: format!("no such tool; available tools are {}", self.names().join(", ")),
            })?;

        let arguments: Value = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments).map_err(|e| ResolvError::InvalidToolArguments {
                tool: name.to_string(),
                reason: format!("arguments are not valid JSON: {}", e),
            })?
        };

        tool.invoke(arguments).await
    }
}

/// The four support tools wired to their shared state.
pub fn support_registry(
    knowledge: KnowledgeRetrieverTool,
    accounts: Arc<AccountStore>,
    activity: Arc<ActivityLog>,
) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(knowledge))
        .with(Arc::new(AccountSettingsTool::new(accounts)))
        .with(Arc::new(DraftReplyTool::new(activity.clone())))
        .with(Arc::new(EscalateTool::new(activity)))
}
