//! CLI-only commands: config info and the model list.
//!
//! These run without an API key and produce plain text output.

use crate::core::config::{self, DEFAULT_MODEL};
use crate::core::models::{Capability, ModelDescriptor, ModelRegistry};
use crate::core::paths;
use crate::core::util;

/// Run the `config` command: display gateway, model, overrides, paths, and API key status.
pub fn run_config() {
    let settings = match config::settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let log_file = paths::log_file()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let model_source = if settings.model_id == DEFAULT_MODEL {
        "default"
    } else {
        "from OMNICHAT_MODEL"
    };
    let show = |v: Option<String>| v.unwrap_or_else(|| "model default".to_string());

    println!("Gateway:      {}", settings.base_url);
    println!("Model:        {} ({})", settings.model_id, model_source);
    println!(
        "Max tokens:   {}",
        show(settings.overrides.max_tokens.map(|n| n.to_string()))
    );
    println!(
        "Temperature:  {}",
        show(settings.overrides.temperature.map(|t| t.to_string()))
    );
    println!(
        "API key:      {}",
        if settings.api_key_set { "set" } else { "not set" }
    );
    println!("Log file:     {}", log_file);
    println!("Exports:      {}", paths::export_dir().display());
}

/// Models matching the optional capability and query, in catalog order.
pub fn select_models<'a>(
    registry: &'a ModelRegistry,
    capability: Option<Capability>,
    query: Option<&str>,
) -> Vec<&'a ModelDescriptor> {
    let candidates = match capability {
        Some(c) => registry.descriptors_by_capability(c),
        None => registry.all().collect(),
    };
    util::filter_by_query(candidates, query.unwrap_or(""), |m| {
        [m.id.as_str(), m.display_name.as_str()]
    })
}

/// Run the `models` command: list catalog models with their capabilities.
pub fn run_models(capability: Option<Capability>, query: Option<&str>) {
    let registry = match ModelRegistry::builtin() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let filtered = select_models(&registry, capability, query);

    if filtered.is_empty() {
        println!("No models found.");
        return;
    }

    let id_w = filtered
        .iter()
        .map(|m| m.id.len())
        .max()
        .unwrap_or(20)
        .max(20);
    let name_w = filtered
        .iter()
        .map(|m| m.display_name.len())
        .max()
        .unwrap_or(24)
        .max(24);

    println!(
        "{:<id_w$}  {:<name_w$}  {:<18}  Capabilities",
        "ID", "Name", "Endpoint"
    );
    println!(
        "{}  {}  {}  ------------",
        "-".repeat(id_w),
        "-".repeat(name_w),
        "-".repeat(18)
    );

    for m in &filtered {
        println!(
            "{:<id_w$}  {:<name_w$}  {:<18}  {}",
            m.id,
            m.display_name,
            m.backend.entry_point(),
            m.capabilities.summary()
        );
    }

    println!("\n{} model(s) listed", filtered.len());
}
