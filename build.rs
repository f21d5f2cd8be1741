//! Build script: validates the embedded model catalog (models.json) at compile time.

use std::collections::HashSet;
use std::path::PathBuf;

fn main() {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR set by Cargo");
    let catalog_path: PathBuf = [&manifest_dir, "config", "models.json"].iter().collect();
    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let json = std::fs::read_to_string(&catalog_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read {}: {}. models.json must exist and be valid.",
            catalog_path.display(),
            e
        )
    });

    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct Capabilities {
        text: bool,
        images: bool,
        vision: bool,
        streaming: bool,
        image_generation: bool,
    }

    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct CatalogEntry {
        id: String,
        display_name: String,
        kind: String,
        backend: String,
        capabilities: Capabilities,
        default_parameters: serde_json::Map<String, serde_json::Value>,
        description: String,
    }

    let entries: Vec<CatalogEntry> = serde_json::from_str(&json).unwrap_or_else(|e| {
        panic!("models.json is invalid JSON: {}. Fix the file and rebuild.", e)
    });

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.id.as_str()) {
            panic!("models.json: duplicate model id '{}'", entry.id);
        }
        if !matches!(entry.kind.as_str(), "chat" | "image_generation") {
            panic!("models.json: '{}' has unknown kind '{}'", entry.id, entry.kind);
        }
        if !matches!(entry.backend.as_str(), "chat" | "text_to_image") {
            panic!(
                "models.json: '{}' has unknown backend '{}'",
                entry.id, entry.backend
            );
        }
    }
}
