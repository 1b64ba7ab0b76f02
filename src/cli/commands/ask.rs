//! Ask command implementation.

use super::start_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command: one turn on a fresh session.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    let orchestrator = start_orchestrator(settings).await?;
    let mut session = orchestrator.new_session();

    let spinner = Output::spinner("Thinking...");
    let result = orchestrator.respond(&mut session, question).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            Output::tool_calls(&outcome.tool_calls);
            println!("\n{}\n", outcome.output);

            let activity = orchestrator.activity().snapshot().await;
            if !activity.is_empty() {
                Output::header("Activity");
                for record in &activity {
                    println!("{}\n", record.render());
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
