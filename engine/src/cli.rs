//! CLI interface for the librarian
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Smart Librarian
///
/// Recommends one book for what you feel like reading, using retrieval over
/// a catalogue of book summaries and a chat completion model.
#[derive(Parser, Debug)]
#[command(name = "librarian")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat (type 'exit' to leave)
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question, e.g. "O carte despre prietenie și magie"
        text: String,
    },

    /// Index the book summaries file into the semantic index
    Ingest {
        /// Empty the collection before indexing
        #[arg(long)]
        reset: bool,
    },

    /// Store the API key in the OS keychain
    Setup,

    /// Run system diagnostics
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["librarian", "--json", "ask", "O carte despre magie"]);
        assert!(cli.json);
        match cli.command {
            Command::Ask { text } => assert_eq!(text, "O carte despre magie"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_reset_with_global_flags() {
        let cli = Cli::parse_from([
            "librarian",
            "ingest",
            "--reset",
            "--config",
            "custom.toml",
            "--log",
            "debug",
        ]);
        assert!(matches!(cli.command, Command::Ingest { reset: true }));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_ask_requires_text() {
        assert!(Cli::try_parse_from(["librarian", "ask"]).is_err());
    }
}
