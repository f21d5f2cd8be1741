//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

use crate::core::models::{Capability, ParameterOverrides};

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  omnichat                                  Start an interactive session
  omnichat -p \"explain X\"                   Single prompt, stream response to stdout
  omnichat -p -                             Read prompt from stdin
  omnichat -m gpt-4o -i photo.jpg -p \"what is this?\"
                                            Ask a vision model about an image
  omnichat -m dall-e-3 -p \"a fox in snow\"   Generate an image, print its URL
  omnichat models --capability vision       List vision-capable models
  omnichat config                           Show configuration and paths
  omnichat completions bash                 Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Terminal chat client for text, vision and image-generation models",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Send a single prompt then exit
    #[arg(
        short = 'p',
        long,
        help = "Provide a prompt to get an immediate AI response (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Model to start with (overrides OMNICHAT_MODEL)
    #[arg(short = 'm', long, help = "Model ID (e.g. gpt-4o, claude, dall-e-3)")]
    pub model: Option<String>,

    /// Attach an image to the prompt (repeatable)
    #[arg(short = 'i', long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Disable streaming (wait for full response before printing)
    #[arg(long, help = "Wait for the full response instead of streaming")]
    pub no_stream: bool,

    /// Override the model's max_tokens
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Override the model's temperature
    #[arg(long, value_name = "T")]
    pub temperature: Option<f64>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show configuration, paths, and API key status
    Config,
    /// List available models
    Models {
        /// Only models with this capability (text, images, vision, streaming, image-generation)
        #[arg(long)]
        capability: Option<Capability>,
        /// Filter models by id or name
        #[arg(long)]
        query: Option<String>,
    },
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }

    /// Flags layered over the environment's overrides.
    pub fn overrides(&self, base: ParameterOverrides) -> ParameterOverrides {
        ParameterOverrides {
            max_tokens: self.max_tokens.or(base.max_tokens),
            temperature: self.temperature.or(base.temperature),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.command.is_none() && self.prompt.is_none()
    }
}
