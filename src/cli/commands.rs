use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "rulekit")]
#[command(author, version, about = "Resolve rule documents with project-local overrides", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Project root (default: nearest directory containing .rulekit, else the current directory)
    #[arg(long, global = true, env = "RULEKIT_ROOT")]
    pub root: Option<PathBuf>,

    /// Base rules directory, overriding rules.base_dir from the configuration
    #[arg(long, global = true, env = "RULEKIT_BASE_DIR")]
    pub base_dir: Option<PathBuf>,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: Single JSON object per command
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize rulekit in the current project
    Init,

    /// Print the rule that applies for a key
    Resolve {
        /// Rule key, e.g. shared/git-workflow
        key: String,
    },

    /// List effective rules and the tier each comes from
    List {
        /// Only list keys under this prefix, e.g. technology/csharp
        prefix: Option<String>,
    },

    /// Combine several rules into one prompt document
    Prompt {
        /// Rule keys, in output order
        #[arg(required = true)]
        keys: Vec<String>,

        /// Maximum combined rule content in characters
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Reset to defaults
    Reset,
}
