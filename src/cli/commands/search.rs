//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command against the knowledge base directly.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'resolv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let spinner = Output::spinner("Indexing knowledge base...");
    let index = Orchestrator::build_index(&settings).await;
    spinner.finish_and_clear();
    let index = index?;

    let results = match index.query(query, limit).await {
        Ok(results) => results,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    if results.is_empty() {
        Output::warning("No results found matching your query.");
    } else {
        Output::success(&format!("Found {} results", results.len()));
        for (i, result) in results.iter().enumerate() {
            Output::search_result(i + 1, &result.chunk.citation(), result.score, &result.chunk.text);
        }
    }

    Ok(())
}
