//! CLI module for Resolv.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Resolv - customer-support chat agent
///
/// Answers support questions from a PDF knowledge base and acts on customer
/// accounts through tool calls.
#[derive(Parser, Debug)]
#[command(name = "resolv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive support chat (/exit to quit, /clear to reset)
    Chat,

    /// Ask a single question and print the agent's answer
    Ask {
        /// The question to ask
        question: String,
    },

    /// Query the knowledge base directly, without the agent
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Start the web chat UI
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from(["resolv", "-vv", "search", "refund policy", "-l", "2"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "refund policy");
                assert_eq!(limit, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
