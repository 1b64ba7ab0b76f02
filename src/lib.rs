//! Resolv - customer-support chat agent
//!
//! A retrieval-augmented support agent that answers questions from a corpus of
//! PDF documents and calls a small set of tools to act on customer accounts.
//!
//! # Overview
//!
//! Resolv allows you to:
//! - Answer support questions grounded in your own PDF knowledge base
//! - Read and change customer subscription plans
//! - Draft email replies and escalate tickets to a human
//! - Chat from the terminal or from a browser
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `documents` - Corpus loading (PDF and plain text)
//! - `chunking` - Fixed-size overlapping chunks
//! - `embedding` - Embedding generation
//! - `index` - In-memory nearest-neighbour index
//! - `accounts` - Mock account table
//! - `activity` - Drafted emails and escalations
//! - `tools` - Tools the agent can call
//! - `agent` - Tool calling loop
//! - `session` - Conversation history
//! - `orchestrator` - Startup wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use resolv::config::Settings;
//! use resolv::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::build(settings).await?;
//!
//!     let mut session = orchestrator.new_session();
//!     let outcome = orchestrator
//!         .respond(&mut session, "How do I reset my password?")
//!         .await?;
//!     println!("{}", outcome.output);
//!
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod activity;
pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod tools;

pub use error::{ResolvError, Result};
