//! Prompt templates for Resolv.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the support agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System message placed at the head of every model context.
    pub system: String,
    /// First assistant message of a web chat session.
    pub greeting: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful and efficient AI support agent. You have a memory of the conversation.

You have tools to search the support knowledge base, read or change a customer's subscription plan, draft email replies, and escalate tickets to a human.

Guidelines:
- Use 'knowledge_base_retriever' for how-to questions, billing policy, subscription plans, troubleshooting and account management topics
- Use 'update_account_settings' to read a user's plan (action 'read') or change it (action 'write' with 'new_plan')
- Use 'draft_reply' to prepare an email to the customer once an issue is resolved
- Use 'escalate_ticket' ONLY when the issue cannot be resolved with the other tools

If a tool reports an error, fix the arguments and try again, or explain the problem to the customer.
Answer concisely and do not invent account details."#
                .to_string(),
            greeting: "Hello! How can I help you resolve your support issue today?".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// The system prompt with custom variables applied.
    pub fn system_prompt(&self) -> String {
        Self::render(&self.agent.system, &self.variables)
    }

    /// The greeting with custom variables applied.
    pub fn greeting(&self) -> String {
        Self::render(&self.agent.greeting, &self.variables)
    }
}
