//! Configuration module for Resolv.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    KnowledgeBaseSettings, LlmSettings, PromptSettings, ServerSettings, Settings,
};
