//! Pre-flight checks before expensive operations.
//!
//! Validates that the API key, the corpus directory and the PDF extractor are
//! available before building the index, so startup fails with a clear message.

use crate::config::{EmbeddingProvider, Settings};
use crate::documents::list_documents;
use crate::error::{ResolvError, Result};
use crate::openai::api_key_from_env;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Talking to the agent needs the LLM key and the corpus.
    Chat,
    /// Searching needs the corpus and the embedder.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    if let Operation::Chat = operation {
        api_key_from_env(&settings.llm.api_key_env)?;
    }

    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        api_key_from_env(&settings.embedding.api_key_env)?;
    }

    match operation {
        Operation::Chat if !settings.knowledge_base.enabled => Ok(()),
        Operation::Search if !settings.knowledge_base.enabled => Err(ResolvError::Config(
            "The knowledge base is disabled (knowledge_base.enabled = false)".to_string(),
        )),
        _ => check_corpus(settings),
    }
}

/// The corpus directory exists and, if it holds PDFs, `pdftotext` is installed.
fn check_corpus(settings: &Settings) -> Result<()> {
    let files = list_documents(&settings.docs_dir())?;
    let has_pdf = files.iter().any(|f| {
        f.extension()
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    });

    if has_pdf {
        check_tool("pdftotext")?;
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-v").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ResolvError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ResolvError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ResolvError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_disabled_knowledge_base() {
        let mut settings = Settings::default();
        settings.knowledge_base.enabled = false;
        assert!(matches!(
            check(Operation::Search, &settings),
            Err(ResolvError::Config(_))
        ));
    }

    #[test]
    fn test_search_text_only_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faq.md"), "# FAQ").unwrap();

        let mut settings = Settings::default();
        settings.knowledge_base.docs_dir = dir.path().to_string_lossy().to_string();
        assert!(check(Operation::Search, &settings).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("resolv-no-such-binary"),
            Err(ResolvError::ToolNotFound(_))
        ));
    }
}
