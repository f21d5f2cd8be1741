//! Interactive line-oriented session: slash commands and chat turns read from stdin.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::controller::{ConversationController, TurnOutcome};
use crate::core::gateway::Gateway;
use crate::core::history::{EntryContent, Role};
use crate::core::models::ModelDescriptor;
use crate::core::paths;
use crate::core::uploads::{UploadError, UploadedImage};

use super::ConsolePresenter;

/// Name given to images attached as a `data:` URL.
const PASTED_NAME: &str = "pasted-image";

const HELP: &str = "\
Commands:
  /attach <path>     Attach an image (file or data: URL) to the next message
  /detach <name>     Remove an attached image
  /images            List attached images
  /model [id]        Show or switch the active model
  /models [query]    List models, optionally filtered by id or name
  /stream [on|off]   Show or set streaming
  /stats             Message counts for this session
  /history           Show the conversation so far
  /clear             Clear the conversation
  /export [dir]      Save the conversation as JSON (default: Downloads)
  /help              Show this help
  /quit              Exit
Anything else is sent as a message.";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Attach(PathBuf),
    Detach(String),
    Images,
    Model(Option<String>),
    Models(Option<String>),
    Stream(Option<bool>),
    Stats,
    History,
    Clear,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Message(String),
    /// A slash command we could not parse, with the reason.
    Invalid(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return SessionCommand::Message(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("attach", Some(path)) => SessionCommand::Attach(PathBuf::from(path)),
            ("attach", None) => SessionCommand::Invalid("Usage: /attach <path>".into()),
            ("detach", Some(name)) => SessionCommand::Detach(name.to_string()),
            ("detach", None) => SessionCommand::Invalid("Usage: /detach <name>".into()),
            ("images", _) => SessionCommand::Images,
            ("model", arg) => SessionCommand::Model(arg.map(str::to_string)),
            ("models", arg) => SessionCommand::Models(arg.map(str::to_string)),
            ("stream", None) => SessionCommand::Stream(None),
            ("stream", Some(arg)) => match arg.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" => SessionCommand::Stream(Some(true)),
                "off" | "false" | "0" => SessionCommand::Stream(Some(false)),
                _ => SessionCommand::Invalid("Usage: /stream [on|off]".into()),
            },
            ("stats", _) => SessionCommand::Stats,
            ("history", _) => SessionCommand::History,
            ("clear", _) => SessionCommand::Clear,
            ("export", arg) => SessionCommand::Export(arg.map(PathBuf::from)),
            ("help" | "?", _) => SessionCommand::Help,
            ("quit" | "exit" | "q", _) => SessionCommand::Quit,
            (other, _) => SessionCommand::Invalid(format!(
                "Unknown command: /{} (type /help for commands)",
                other
            )),
        }
    }
}

fn model_line(model: &ModelDescriptor) -> String {
    format!(
        "{:<46} {:<24} {:<18} {}",
        model.id,
        model.display_name,
        model.backend.entry_point(),
        model.capabilities.summary()
    )
}

fn prompt(model: &str) {
    let mut out = io::stdout();
    let _ = write!(out, "{}> ", model);
    let _ = out.flush();
}

/// Read lines from stdin until EOF or `/quit`.
pub async fn run_session<G: Gateway>(
    controller: &ConversationController<G>,
    mut streaming: bool,
) -> io::Result<()> {
    let mut presenter = ConsolePresenter::stdio();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{} {} - model {}, {} models available (type /help for commands)",
        crate::core::app::NAME,
        crate::core::app::VERSION,
        controller.active_model(),
        controller.registry().len()
    );

    loop {
        prompt(&controller.active_model());
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim().is_empty() && !controller.has_pending_uploads() {
            continue;
        }

        match SessionCommand::parse(&line) {
            SessionCommand::Message(text) => {
                if let TurnOutcome::Rejected = controller
                    .send_pending(&text, streaming, &mut presenter)
                    .await
                {
                    eprintln!("A request is already being processed");
                }
            }
            SessionCommand::Attach(path) => attach(controller, &path).await,
            SessionCommand::Detach(name) => {
                if controller.detach(&name) {
                    println!("Removed {}", name);
                } else {
                    eprintln!("No attached image named {}", name);
                }
            }
            SessionCommand::Images => {
                let names = controller.pending_uploads();
                if names.is_empty() {
                    println!("No images attached");
                } else {
                    println!("{}", names.join("\n"));
                }
            }
            SessionCommand::Model(None) => match controller.active_descriptor() {
                Some(model) => {
                    println!("{}", model_line(model));
                    println!("{}", model.description);
                    let defaults = controller.registry().default_parameters(&model.id);
                    println!("Defaults: {}", serde_json::Value::Object(defaults));
                }
                None => println!("{}", controller.active_model()),
            },
            SessionCommand::Model(Some(id)) => match controller.select_model(&id) {
                Ok(model) => {
                    println!("Switched to {} ({})", model.display_name, model.id);
                    if controller.registry().is_image_generation_model(&model.id) {
                        println!("Prompts to this model generate images");
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            SessionCommand::Models(query) => {
                for model in controller.registry().filter(query.as_deref().unwrap_or("")) {
                    println!("{}", model_line(model));
                }
            }
            SessionCommand::Stream(None) => {
                println!("Streaming is {}", if streaming { "on" } else { "off" });
            }
            SessionCommand::Stream(Some(on)) => {
                streaming = on;
                println!("Streaming {}", if on { "enabled" } else { "disabled" });
            }
            SessionCommand::Stats => {
                let stats = controller.usage_stats();
                println!(
                    "{} messages ({} user, {} assistant, {} with images)",
                    stats.total, stats.user, stats.assistant, stats.with_images
                );
            }
            SessionCommand::History => print_history(controller),
            SessionCommand::Clear => {
                controller.clear_history();
                println!("Conversation cleared");
            }
            SessionCommand::Export(dir) => {
                let dir = dir.unwrap_or_else(paths::export_dir);
                match controller.export_to_dir(&dir) {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => eprintln!("Error: export failed: {}", e),
                }
            }
            SessionCommand::Help => println!("{}", HELP),
            SessionCommand::Quit => break,
            SessionCommand::Invalid(msg) => eprintln!("{}", msg),
        }
    }
    Ok(())
}

async fn load_attachment(path: &Path) -> Result<UploadedImage, UploadError> {
    match path.to_str() {
        Some(url) if url.starts_with("data:") => UploadedImage::from_data_url(PASTED_NAME, url),
        _ => UploadedImage::from_path(path).await,
    }
}

async fn attach<G: Gateway>(controller: &ConversationController<G>, path: &Path) {
    match load_attachment(path).await {
        Ok(image) => {
            let name = image.source_name.clone();
            if controller.attach(image) {
                println!("Replaced {}", name);
            } else {
                println!("Attached {}", name);
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn print_history<G: Gateway>(controller: &ConversationController<G>) {
    let history = controller.history();
    if history.is_empty() {
        println!("No messages yet");
        return;
    }
    for entry in history.entries() {
        let who = match entry.role {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        let images = if entry.has_images() {
            format!(" [{} image(s)]", entry.attached_images.len())
        } else {
            String::new()
        };
        let body = match &entry.content {
            EntryContent::Text(text) => text.clone(),
            EntryContent::Image(handle) if handle.is_inline() => "(generated image)".to_string(),
            EntryContent::Image(handle) => format!("(image) {}", handle.url),
        };
        println!(
            "[{}] {}{}: {}",
            entry.timestamp.format("%H:%M:%S"),
            who,
            images,
            body
        );
    }
}
