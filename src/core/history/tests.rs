//! History module tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::core::gateway::ImageHandle;
use crate::core::history::{
    ConversationEntry, EntryContent, HISTORY_CAP, History, ImageRef, Role, UsageStats,
    export_file_name, export_json, export_to_dir,
};

fn text(role: Role, s: &str) -> ConversationEntry {
    ConversationEntry::new(role, EntryContent::Text(s.to_string()))
}

fn pixel_ref() -> ImageRef {
    ImageRef {
        name: "pixel.png".to_string(),
        size_bytes: 68,
    }
}

#[test]
fn push_beyond_cap_keeps_most_recent_in_order() {
    let mut history = History::default();
    for i in 0..25 {
        history.push(text(Role::User, &format!("m{}", i)));
    }
    assert_eq!(history.len(), HISTORY_CAP);
    let contents: Vec<&str> = history.entries().map(|e| e.content.as_display()).collect();
    let expected: Vec<String> = (5..25).map(|i| format!("m{}", i)).collect();
    assert_eq!(contents, expected);
}

#[test]
fn entries_get_distinct_ids() {
    let a = text(Role::User, "a");
    let b = text(Role::User, "a");
    assert_ne!(a.id, b.id);
}

#[test]
fn clear_empties_history() {
    let mut history = History::default();
    history.push(text(Role::User, "hi"));
    history.clear();
    assert!(history.is_empty());
    assert!(history.last().is_none());
}

#[test]
fn stats_count_roles_and_images() {
    let mut history = History::default();
    history.push(ConversationEntry::user("look", vec![pixel_ref()]));
    history.push(text(Role::Assistant, "a pixel"));
    history.push(ConversationEntry::user("thanks", vec![]));
    history.push(text(Role::System, "note"));
    assert_eq!(
        history.stats(),
        UsageStats {
            total: 4,
            user: 2,
            assistant: 1,
            with_images: 1,
        }
    );
}

#[test]
fn image_content_displays_as_url() {
    let content = EntryContent::Image(ImageHandle {
        url: "https://img.example/cat.png".to_string(),
        revised_prompt: None,
    });
    assert_eq!(content.as_display(), "https://img.example/cat.png");
}

#[test]
fn export_json_uses_file_format_fields() {
    let mut history = History::default();
    let mut entry = ConversationEntry::user("describe this", vec![pixel_ref()]);
    entry.timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    history.push(entry);
    history.push(text(Role::Assistant, "A pixel."));

    let json: Value = serde_json::from_str(&export_json(&history).unwrap()).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["role"], "user");
    assert_eq!(items[0]["content"], "describe this");
    assert_eq!(items[0]["timestamp"], "2024-03-09T14:05:07.000Z");
    assert_eq!(items[0]["hasImages"], true);
    assert_eq!(items[1]["role"], "assistant");
    assert_eq!(items[1]["hasImages"], false);
}

#[test]
fn export_timestamps_parse_back_for_live_entries() {
    let mut history = History::default();
    for i in 0..HISTORY_CAP + 3 {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        history.push(text(role, &format!("m{}", i)));
    }

    let json: Value = serde_json::from_str(&export_json(&history).unwrap()).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), history.len());
    for (item, entry) in items.iter().zip(history.entries()) {
        let stamp = item["timestamp"].as_str().unwrap();
        assert!(stamp.ends_with('Z'), "{}", stamp);
        let parsed = DateTime::parse_from_rfc3339(stamp).expect("rfc3339 timestamp");
        assert_eq!(
            parsed.timestamp_millis(),
            entry.timestamp.timestamp_millis()
        );
        assert_eq!(item["content"], entry.content.as_display());
    }
}

#[test]
fn export_file_name_has_date() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    assert_eq!(
        export_file_name(date),
        "omnichat-conversation-2024-01-31.json"
    );
}

#[test]
fn export_to_dir_writes_file() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let mut history = History::default();
    history.push(text(Role::User, "hello"));

    let path = export_to_dir(&history, dir.path()).expect("export");
    assert!(path.starts_with(dir.path()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("omnichat-conversation-"));
    assert!(name.ends_with(".json"));

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written[0]["content"], "hello");
    assert!(!path.with_extension("tmp").exists());
}
