//! JSON export of the conversation (`omnichat-conversation-YYYY-MM-DD.json`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use crate::core::app;

use super::{ConversationEntry, History, Role};

/// One exported entry. Field names follow the export file format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntry<'a> {
    pub role: Role,
    pub content: &'a str,
    pub timestamp: String,
    pub has_images: bool,
}

impl<'a> From<&'a ConversationEntry> for ExportedEntry<'a> {
    fn from(entry: &'a ConversationEntry) -> Self {
        Self {
            role: entry.role,
            content: entry.content.as_display(),
            timestamp: entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            has_images: entry.has_images(),
        }
    }
}

/// Pretty-printed JSON array of the history, oldest first.
pub fn export_json(history: &History) -> serde_json::Result<String> {
    let entries: Vec<ExportedEntry<'_>> = history.entries().map(ExportedEntry::from).collect();
    serde_json::to_string_pretty(&entries)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}-conversation-{}.json", app::NAME, date.format("%Y-%m-%d"))
}

/// Write the export into `dir` under today's (UTC) file name. Returns the written path.
pub fn export_to_dir(history: &History, dir: &Path) -> io::Result<PathBuf> {
    let json = export_json(history).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(tmp, &path)?;
    log::info!("Exported {} entries to {}", history.len(), path.display());
    Ok(path)
}
