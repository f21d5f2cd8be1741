//! # omnichat - terminal chat client
//!
//! Talks to text, vision and image-generation models through one OpenAI-compatible gateway.
//!
//! ## Features
//! - Single prompt mode with `-p` or `--prompt` (streamed to stdout)
//! - Interactive session with slash commands (default)
//! - Image attachments for vision models, image generation for DALL-E style models
//! - `config`, `models` and `completions` subcommands that need no API key

mod cli;
mod console;
mod core;
mod run;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

use cli::{Args, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();
    run::init_logger(&args);

    match &args.command {
        Some(Commands::Config) => {
            core::cli::run_config();
            return Ok(());
        }
        Some(Commands::Models { capability, query }) => {
            core::cli::run_models(*capability, query.as_deref());
            return Ok(());
        }
        Some(Commands::Completions { shell }) => {
            cli::generate(
                *shell,
                &mut Args::command(),
                core::app::NAME,
                &mut std::io::stdout(),
            );
            return Ok(());
        }
        None => {}
    }

    // Print user-friendly message; exit uses Display not Debug
    let config = core::config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let result = match args.prompt.as_deref() {
        Some(prompt) => run::run_single_prompt(&args, &config, prompt).await,
        None => run::run_interactive(&args, &config).await,
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
