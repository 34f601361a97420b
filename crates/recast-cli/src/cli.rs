//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Recast CLI - schema-validated replies from locally hosted models
///
/// Send prompts to a local Ollama server, validate the JSON replies
/// against a response schema, and transparently repair malformed output
/// with a secondary model.
#[derive(Parser, Debug)]
#[command(
    name = "recast",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "RECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a prompt and print the validated reply
    Ask(AskArgs),

    /// Validate a payload against a response schema without any network traffic
    Validate(ValidateArgs),

    /// Inspect response schema files
    Schema(SchemaArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the ask command
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The prompt to send
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    /// Path to the response schema file (JSON or YAML); free text when omitted
    #[arg(short, long, value_name = "SCHEMA")]
    pub schema: Option<PathBuf>,

    /// System prompt for the exchange
    #[arg(long)]
    pub system: Option<String>,

    /// Model answering the prompt
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model fixing malformed replies
    #[arg(long)]
    pub repair_model: Option<String>,

    /// Base URL of the model server
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep the model loaded for this many seconds after answering
    #[arg(long)]
    pub keep_alive_secs: Option<u64>,

    /// Repair requests allowed before giving up; 0 disables repair
    #[arg(long)]
    pub max_repair_attempts: Option<u32>,

    /// Save the validated value to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the response schema file (JSON or YAML)
    #[arg(short, long, value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Payload file to validate; stdin when omitted or "-"
    #[arg(value_name = "PAYLOAD")]
    pub payload: Option<PathBuf>,
}

/// Arguments for the schema command
#[derive(Parser, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub action: SchemaAction,
}

/// Schema inspection actions
#[derive(Subcommand, Debug)]
pub enum SchemaAction {
    /// Check a schema file for well-formedness
    Check(SchemaFileArgs),

    /// Print the rendered JSON Schema document
    Show(SchemaFileArgs),
}

/// A single schema file argument
#[derive(Parser, Debug)]
pub struct SchemaFileArgs {
    /// Path to the response schema file (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// YAML output
    Yaml,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
