//! In-memory conversation history for the current session, with JSON export.

mod export;

pub use export::export_to_dir;
#[cfg(test)]
pub use export::{export_file_name, export_json};

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::gateway::ImageHandle;

/// Oldest entries are dropped beyond this many.
pub const HISTORY_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// What an entry shows: text, or a generated image.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryContent {
    Text(String),
    Image(ImageHandle),
}

impl EntryContent {
    /// Text form used for export and plain-text display. Images render as their URL.
    pub fn as_display(&self) -> &str {
        match self {
            EntryContent::Text(text) => text,
            EntryContent::Image(handle) => &handle.url,
        }
    }
}

/// Name and size of an image that was attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    pub id: Uuid,
    pub role: Role,
    pub content: EntryContent,
    pub attached_images: Vec<ImageRef>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(role: Role, content: EntryContent) -> Self {
        Self::with_id(Uuid::new_v4(), role, content)
    }

    /// Entry under an id chosen earlier, e.g. the one announced while streaming.
    pub fn with_id(id: Uuid, role: Role, content: EntryContent) -> Self {
        Self {
            id,
            role,
            content,
            attached_images: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>, attached_images: Vec<ImageRef>) -> Self {
        Self {
            attached_images,
            ..Self::new(Role::User, EntryContent::Text(text.into()))
        }
    }

    pub fn assistant(content: EntryContent) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn has_images(&self) -> bool {
        !self.attached_images.is_empty()
    }
}

/// Counts over the entries currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    pub with_images: usize,
}

/// Bounded, append-only list of entries in display order.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<ConversationEntry>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_cap(HISTORY_CAP)
    }
}

impl History {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append, evicting from the front once over capacity.
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.cap {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("history full, dropped entry {}", evicted.id);
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> UsageStats {
        self.entries.iter().fold(
            UsageStats {
                total: self.entries.len(),
                ..Default::default()
            },
            |mut stats, entry| {
                match entry.role {
                    Role::User => stats.user += 1,
                    Role::Assistant => stats.assistant += 1,
                    Role::System => {}
                }
                if entry.has_images() {
                    stats.with_images += 1;
                }
                stats
            },
        )
    }
}

#[cfg(test)]
mod tests;
