//! Application run modes: logger init, single prompt, interactive session.

use std::io;
use std::sync::Arc;

use crate::cli::Args;
use crate::console::{self, ConsolePresenter};
use crate::core;
use crate::core::config::Config;
use crate::core::controller::{ConversationController, TurnOutcome};
use crate::core::gateway::{self, OpenAiGateway, PING_INTERVAL, STARTUP_WAIT};
use crate::core::models::ModelRegistry;
use crate::core::uploads::UploadedImage;

/// Initialize env_logger. In interactive mode, writes to file so logs don't interleave with the chat.
pub fn init_logger(args: &Args) {
    let log_level = args.log_level();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));

    if args.is_interactive()
        && let Some(path) = core::paths::log_file()
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        logger.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = logger.try_init();
}

/// Controller over the live gateway, starting on `-m` or the configured model, with overrides applied.
fn build_controller(
    args: &Args,
    config: &Config,
) -> Result<ConversationController<OpenAiGateway>, Box<dyn std::error::Error>> {
    let registry = Arc::new(ModelRegistry::builtin()?);
    let model = args.model.as_deref().unwrap_or(&config.model_id);
    let controller = ConversationController::new(registry, OpenAiGateway::new(config), model)?;
    controller.set_overrides(args.overrides(config.overrides));
    Ok(controller)
}

async fn attach_images(
    controller: &ConversationController<OpenAiGateway>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    for path in &args.images {
        let image = UploadedImage::from_path(path).await?;
        log::info!("attached {} ({} bytes)", image.source_name, image.size_bytes);
        controller.attach(image);
    }
    Ok(())
}

/// Run single prompt mode: one turn, reply to stdout. Exits with status 1 if the turn fails.
pub async fn run_single_prompt(
    args: &Args,
    config: &Config,
    prompt_arg: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = if prompt_arg == "-" {
        io::read_to_string(io::stdin())?
    } else {
        prompt_arg.to_string()
    };
    let prompt = prompt.trim();

    let controller = build_controller(args, config)?;
    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(UploadedImage::from_path(path).await?);
    }

    gateway::wait_until_ready(controller.gateway(), STARTUP_WAIT, PING_INTERVAL).await?;

    let mut presenter = ConsolePresenter::stdio();
    let outcome = controller
        .send_user_turn(prompt, images, !args.no_stream, &mut presenter)
        .await;
    if !matches!(outcome, TurnOutcome::Completed(_)) {
        std::process::exit(1);
    }
    Ok(())
}

/// Run the interactive session until EOF or `/quit`.
pub async fn run_interactive(args: &Args, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let controller = build_controller(args, config)?;
    attach_images(&controller, args).await?;

    gateway::wait_until_ready(controller.gateway(), STARTUP_WAIT, PING_INTERVAL).await?;

    console::run_session(&controller, !args.no_stream).await?;
    Ok(())
}
