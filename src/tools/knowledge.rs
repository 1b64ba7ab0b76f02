//! Knowledge base retrieval tool.

use super::{parse_arguments, Tool, ToolOutput};
use crate::error::Result;
use crate::index::EmbeddingIndex;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Returned when the index exists but nothing matched.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the knowledge base.";

/// Returned when no index was ever built.
pub const NOT_INITIALIZED: &str = "Error: The knowledge base is not initialized.";

#[derive(Debug, Deserialize)]
struct RetrieveArgs {
    query: String,
}

/// Answers free-text questions from the embedded corpus.
pub struct KnowledgeRetrieverTool {
    index: Option<Arc<EmbeddingIndex>>,
    top_k: usize,
}

impl KnowledgeRetrieverTool {
    pub fn new(index: Arc<EmbeddingIndex>, top_k: usize) -> Self {
        Self {
            index: Some(index),
            top_k,
        }
    }

    /// A retriever with no index behind it.
    pub fn uninitialized() -> Self {
        Self {
            index: None,
            top_k: 1,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    /// Concatenated text of the nearest chunks for `query`.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let Some(index) = &self.index else {
            return Ok(NOT_INITIALIZED.to_string());
        };

        let results = index.query(query, self.top_k).await?;
        debug!("Retrieved {} chunk(s) for {:?}", results.len(), query);

        if results.is_empty() {
            return Ok(NO_RELEVANT_INFORMATION.to_string());
        }

        Ok(results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[async_trait]
impl Tool for KnowledgeRetrieverTool {
    fn name(&self) -> &str {
        "knowledge_base_retriever"
    }

    fn description(&self) -> &str {
        "Use this tool to find information and answer questions about IT support topics. \
         It is the primary source for password resets, billing issues, subscription plans, \
         technical troubleshooting, and account management."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question or search terms"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolOutput> {
        let args: RetrieveArgs = parse_arguments(self.name(), arguments)?;
        Ok(ToolOutput::text(self.retrieve(&args.query).await?))
    }
}
