//! Interactive chat command.

use super::start_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What a line of REPL input asks for.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Exit,
    Clear,
    Skip,
    Turn(&'a str),
}

fn parse_line(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        ReplCommand::Skip
    } else if line.eq_ignore_ascii_case("/exit") {
        ReplCommand::Exit
    } else if line.eq_ignore_ascii_case("/clear") {
        ReplCommand::Clear
    } else {
        ReplCommand::Turn(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let orchestrator = start_orchestrator(settings).await?;
    let mut session = Session::new();

    println!("\n{}", style("Resolv Support").bold().cyan());
    println!(
        "{}\n",
        style("Describe your issue. Type /clear to start over, /exit to quit.").dim()
    );
    Output::assistant(&orchestrator.prompts().greeting());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        match parse_line(&input) {
            ReplCommand::Skip => continue,
            ReplCommand::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ReplCommand::Clear => {
                session.clear();
                Output::info("Conversation history cleared.");
            }
            ReplCommand::Turn(text) => {
                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.respond(&mut session, text).await;
                spinner.finish_and_clear();

                match result {
                    Ok(outcome) => {
                        Output::tool_calls(&outcome.tool_calls);
                        Output::assistant(&outcome.output);
                        if outcome.escalated {
                            Output::warning("This issue has been escalated to a human agent.");
                        }
                    }
                    Err(e) => {
                        Output::error(&format!("Something went wrong: {}", e));
                    }
                }
            }
        }
    }

    Ok(())
}
