//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

/// Pre-flight, then build the orchestrator behind a spinner.
pub(crate) async fn start_orchestrator(settings: Settings) -> anyhow::Result<Orchestrator> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'resolv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let spinner = Output::spinner("Loading knowledge base...");
    let result = Orchestrator::build(settings).await;
    spinner.finish_and_clear();

    let orchestrator = result?;
    if let Some(index) = orchestrator.index() {
        Output::info(&format!(
            "Indexed {} chunk(s) from {} document(s)",
            index.len(),
            index.sources().len()
        ));
    }
    Ok(orchestrator)
}
