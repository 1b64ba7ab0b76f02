//! The language model seam.
//!
//! The loop only needs `predict(context, tools) -> Final | ToolCalls`, so any
//! backend (or a scripted fake in tests) can drive it. [`OpenAIChatModel`]
//! talks to an OpenAI-compatible chat completions endpoint.

use crate::config::LlmSettings;
use crate::error::{ResolvError, Result};
use crate::openai::create_client;
use crate::tools::ToolSpec;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as the model produced them.
    pub arguments: String,
}

/// What the model answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Final(String),
    ToolCalls(Vec<ToolRequest>),
}

/// Working context of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextMessage {
    System(String),
    User(String),
    Assistant(String),
    AssistantToolCalls(Vec<ToolRequest>),
    Tool { call_id: String, content: String },
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn predict(&self, context: &[ContextMessage], tools: &[ToolSpec]) -> Result<ModelReply>;
}

/// Chat completions over an OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: None,
        }
    }

    /// Build from `[llm]` settings. Fails when the API key is missing.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = create_client(
            &settings.api_base,
            &settings.api_key_env,
            Duration::from_secs(settings.timeout_secs),
        )?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip_all, fields(model = %self.model, messages = context.len()))]
    async fn predict(&self, context: &[ContextMessage], tools: &[ToolSpec]) -> Result<ModelReply> {
        let messages = context
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !tools.is_empty() {
            args.tools(tools.iter().map(to_tool_definition).collect::<Vec<_>>());
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(|e| ResolvError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ResolvError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ResolvError::Agent("No response from model".to_string()))?;

        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool call(s)", calls.len());
                Ok(ModelReply::ToolCalls(
                    calls
                        .into_iter()
                        .map(|c| ToolRequest {
                            id: c.id,
                            name: c.function.name,
                            arguments: c.function.arguments,
                        })
                        .collect(),
                ))
            }
            _ => Ok(ModelReply::Final(strip_reasoning(
                &choice.message.content.unwrap_or_default(),
            ))),
        }
    }
}

fn to_request_message(message: &ContextMessage) -> Result<ChatCompletionRequestMessage> {
    let build_err = |e: async_openai::error::OpenAIError| ResolvError::Agent(e.to_string());

    let message = match message {
        ContextMessage::System(text) => ChatCompletionRequestSystemMessageArgs::default()
            .content(text.clone())
            .build()
            .map_err(build_err)?
            .into(),
        ContextMessage::User(text) => ChatCompletionRequestUserMessageArgs::default()
            .content(text.clone())
            .build()
            .map_err(build_err)?
            .into(),
        ContextMessage::Assistant(text) => ChatCompletionRequestAssistantMessageArgs::default()
            .content(text.clone())
            .build()
            .map_err(build_err)?
            .into(),
        ContextMessage::AssistantToolCalls(requests) => {
            ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(
                    requests
                        .iter()
                        .map(|r| ChatCompletionMessageToolCall {
                            id: r.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: r.name.clone(),
                                arguments: r.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                )
                .build()
                .map_err(build_err)?
                .into()
        }
        ContextMessage::Tool { call_id, content } => {
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call_id.clone())
                .content(content.clone())
                .build()
                .map_err(build_err)?
                .into()
        }
    };

    Ok(message)
}

fn to_tool_definition(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

/// Drop a leading `<think>...</think>` block some reasoning models emit.
pub fn strip_reasoning(content: &str) -> String {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim().to_string();
        }
    }
    content.trim().to_string()
}
