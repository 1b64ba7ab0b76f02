//! CLI output formatting utilities.

use crate::agent::ToolInvocation;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an agent reply.
    pub fn assistant(msg: &str) {
        println!("\n{} {}\n", style("Agent:").green().bold(), msg);
    }

    /// Print the tools used during a turn.
    pub fn tool_calls(calls: &[ToolInvocation]) {
        if calls.is_empty() {
            return;
        }
        let names: Vec<String> = calls.iter().map(|c| c.to_string()).collect();
        println!("{}", style(format!("[tools: {}]", names.join(", "))).dim());
    }

    /// Print a search result.
    pub fn search_result(rank: usize, citation: &str, score: f32, content: &str) {
        println!(
            "\n{} {} {} (score: {:.2})",
            style(format!("{}.", rank)).green(),
            style(citation).bold(),
            style("|").dim(),
            score
        );
        println!("   {}", content_preview(content, 300));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(s) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(s);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and truncate with ellipsis on a char boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
