//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use crate::documents::list_documents;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Resolv Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();
    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section("External Tools", vec![check_pdftotext()]);

    let mut keys = vec![check_api_key(&settings.llm.api_key_env, true)];
    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        keys.push(check_api_key(&settings.embedding.api_key_env, true));
    }
    section("API Configuration", keys);

    section("Knowledge Base", check_knowledge_base(settings));
    section("Configuration", vec![check_config_file()]);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Resolv.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Resolv is ready to use.");
    }

    Ok(())
}

/// `pdftotext -v` prints its version on stderr.
fn check_pdftotext() -> CheckResult {
    let hint = install_hint_poppler();
    match Command::new("pdftotext").arg("-v").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stderr)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok("pdftotext", &version)
        }
        Ok(_) => CheckResult::error("pdftotext", "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning("pdftotext", "not found (PDF documents cannot be read)", hint)
        }
        Err(e) => CheckResult::error("pdftotext", &format!("error: {}", e), hint),
    }
}

/// Check that an API key variable is set, showing only its edges.
fn check_api_key(var: &str, required: bool) -> CheckResult {
    let hint = format!("Set with: export {}='...' (or add it to .env)", var);
    match std::env::var(var) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Ok(key) => CheckResult::ok(var, &format!("configured ({})", mask(&key))),
        Err(_) if required => CheckResult::error(var, "not set", &hint),
        Err(_) => CheckResult::warning(var, "not set", &hint),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_knowledge_base(settings: &Settings) -> Vec<CheckResult> {
    if !settings.knowledge_base.enabled {
        return vec![CheckResult::warning(
            "Knowledge base",
            "disabled",
            "Set knowledge_base.enabled = true to answer from documents",
        )];
    }

    let dir = settings.docs_dir();
    match list_documents(&dir) {
        Ok(files) if files.is_empty() => vec![CheckResult::warning(
            "Documents",
            &format!("{} (empty)", dir.display()),
            "Add PDF, .txt or .md files to this directory",
        )],
        Ok(files) => vec![CheckResult::ok(
            "Documents",
            &format!("{} ({} file(s))", dir.display(), files.len()),
        )],
        Err(_) => vec![CheckResult::error(
            "Documents",
            &format!("{} not found", dir.display()),
            "Create the directory or set knowledge_base.docs_dir",
        )],
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: resolv config edit",
        )
    }
}

/// Platform-specific install hint for pdftotext.
fn install_hint_poppler() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install poppler"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install poppler-utils (or your package manager)"
    } else {
        "Install poppler from: https://poppler.freedesktop.org"
    }
}
