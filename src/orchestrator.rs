//! Startup wiring for Resolv.
//!
//! Loads the corpus, builds the embedding index, seeds the account table and
//! registers the tools the agent may call.

use crate::accounts::AccountStore;
use crate::activity::ActivityLog;
use crate::agent::{Agent, ChatModel, OpenAIChatModel, TurnOutcome};
use crate::chunking::{ChunkingConfig, WindowChunker};
use crate::config::{Prompts, Settings};
use crate::documents::load_corpus;
use crate::embedding::create_embedder;
use crate::error::{ResolvError, Result};
use crate::index::EmbeddingIndex;
use crate::session::{ConversationTurn, Session};
use crate::tools::{support_registry, KnowledgeRetrieverTool};
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything a support session needs, built once per process.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    index: Option<Arc<EmbeddingIndex>>,
    accounts: Arc<AccountStore>,
    activity: Arc<ActivityLog>,
    agent: Agent,
}

impl Orchestrator {
    /// Build from settings: read the API key, ingest the corpus and index it.
    ///
    /// A missing key or missing corpus directory is fatal.
    pub async fn build(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model = OpenAIChatModel::from_settings(&settings.llm)?;
        info!("Using chat model {}", model.model());

        let index = if settings.knowledge_base.enabled {
            Some(Arc::new(Self::build_index(&settings).await?))
        } else {
            info!("Knowledge base disabled");
            None
        };

        Ok(Self::with_components(settings, prompts, Arc::new(model), index))
    }

    /// Ingest the configured corpus and embed it.
    #[instrument(skip_all, fields(docs_dir = %settings.docs_dir().display()))]
    pub async fn build_index(settings: &Settings) -> Result<EmbeddingIndex> {
        let pages = load_corpus(&settings.docs_dir()).await?;

        let chunker = WindowChunker::new(ChunkingConfig::from(&settings.knowledge_base));
        let chunks = chunker.chunk_pages(&pages);
        info!("Split {} page(s) into {} chunk(s)", pages.len(), chunks.len());

        let embedder = create_embedder(&settings.embedding)?;
        EmbeddingIndex::build(chunks, embedder).await
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        model: Arc<dyn ChatModel>,
        index: Option<Arc<EmbeddingIndex>>,
    ) -> Self {
        let accounts = Arc::new(AccountStore::new(settings.accounts.clone()));
        let activity = Arc::new(ActivityLog::new());

        let retriever = match &index {
            Some(index) => KnowledgeRetrieverTool::new(index.clone(), settings.knowledge_base.top_k),
            None => KnowledgeRetrieverTool::uninitialized(),
        };
        let tools = support_registry(retriever, accounts.clone(), activity.clone());

        let agent = Agent::new(model, tools, &prompts.system_prompt())
            .with_max_iterations(settings.agent.max_iterations);

        Self {
            settings,
            prompts,
            index,
            accounts,
            activity,
            agent,
        }
    }

    /// A fresh session opening with the configured greeting.
    pub fn new_session(&self) -> Session {
        Session::with_greeting(self.prompts.greeting())
    }

    /// Answer one user turn and record it in `session`.
    ///
    /// Blank input is rejected. On error the session is left untouched.
    pub async fn respond(&self, session: &mut Session, input: &str) -> Result<TurnOutcome> {
        if input.trim().is_empty() {
            return Err(ResolvError::InvalidInput("message must not be empty".to_string()));
        }
        let outcome = self.agent.run_turn(session.turns(), input).await?;
        session.push(ConversationTurn::user(input));
        session.push(ConversationTurn::assistant(outcome.output.clone()));
        Ok(outcome)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn index(&self) -> Option<Arc<EmbeddingIndex>> {
        self.index.clone()
    }

    pub fn accounts(&self) -> Arc<AccountStore> {
        self.accounts.clone()
    }

    pub fn activity(&self) -> Arc<ActivityLog> {
        self.activity.clone()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ContextMessage, ModelReply};
    use crate::error::ResolvError;
    use crate::tools::ToolSpec;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ChatModel for Echo {
        async fn predict(&self, context: &[ContextMessage], _tools: &[ToolSpec]) -> Result<ModelReply> {
            match context.last() {
                Some(ContextMessage::User(text)) if text == "boom" => {
                    Err(ResolvError::OpenAI("unreachable".to_string()))
                }
                Some(ContextMessage::User(text)) => Ok(ModelReply::Final(format!("echo: {}", text))),
                _ => Ok(ModelReply::Final(String::new())),
            }
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::with_components(Settings::default(), Prompts::default(), Arc::new(Echo), None)
    }

    #[tokio::test]
    async fn test_respond_appends_both_turns() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session();
        assert_eq!(session.len(), 1);

        let outcome = orchestrator.respond(&mut session, "hi").await.unwrap();
        assert_eq!(outcome.output, "echo: hi");
        assert_eq!(session.len(), 3);
        assert_eq!(session.turns()[2], ConversationTurn::assistant("echo: hi"));
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session();
        let result = orchestrator.respond(&mut session, "  \n").await;
        assert!(matches!(result, Err(ResolvError::InvalidInput(_))));
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn test_error_leaves_session_untouched() {
        let orchestrator = orchestrator();
        let mut session = Session::new();
        assert!(orchestrator.respond(&mut session, "boom").await.is_err());
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_accounts_seeded_from_settings() {
        let orchestrator = orchestrator();
        assert_eq!(orchestrator.accounts().len().await, 2);
        assert!(orchestrator.index().is_none());
        assert_eq!(orchestrator.agent().tools().len(), 4);
    }

    #[tokio::test]
    async fn test_build_index_from_text_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("faq.txt"),
            "To reset your password, use the Forgot password link.",
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.knowledge_base.docs_dir = dir.path().to_string_lossy().to_string();

        let index = Orchestrator::build_index(&settings).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.sources(), vec!["faq.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_build_index_missing_dir_is_fatal() {
        let mut settings = Settings::default();
        settings.knowledge_base.docs_dir = "/definitely/not/a/resolv/corpus".to_string();
        let result = Orchestrator::build_index(&settings).await;
        assert!(matches!(result, Err(ResolvError::Config(_))));
    }
}
