//! Console presentation: prints controller events to the terminal, and the interactive session.

mod session;

pub use session::run_session;

use std::io::{self, Write};

use uuid::Uuid;

use crate::core::controller::Presenter;
use crate::core::gateway::ImageHandle;
use crate::core::history::{ConversationEntry, EntryContent, Role};

/// Writes replies to `out` and errors to `err`. Streamed text is printed as it arrives.
pub struct ConsolePresenter<W: Write, E: Write> {
    out: W,
    err: E,
    /// Stream being printed and how many bytes of it are already out.
    streaming: Option<(Uuid, usize)>,
}

impl ConsolePresenter<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> ConsolePresenter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            streaming: None,
        }
    }

    #[cfg(test)]
    fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }

    fn is_streaming(&self, id: Uuid) -> bool {
        self.streaming.is_some_and(|(current, _)| current == id)
    }
}

impl<W: Write, E: Write> Presenter for ConsolePresenter<W, E> {
    fn on_message_appended(&mut self, entry: &ConversationEntry) {
        match (entry.role, &entry.content) {
            (Role::User, _) => {
                for image in &entry.attached_images {
                    let _ = writeln!(
                        self.err,
                        "[attached {} ({} KB)]",
                        image.name,
                        image.size_bytes.div_ceil(1024)
                    );
                }
            }
            // Already printed through streaming updates.
            (Role::Assistant, _) if self.is_streaming(entry.id) => {}
            (_, EntryContent::Text(text)) => {
                let _ = writeln!(self.out, "{}", text);
            }
            // Printed by on_image_generated.
            (_, EntryContent::Image(_)) => {}
        }
        let _ = self.out.flush();
    }

    fn on_streaming_update(&mut self, id: Uuid, text: &str) {
        let printed = match self.streaming {
            Some((current, printed)) if current == id => printed,
            _ => 0,
        };
        if let Some(delta) = text.get(printed..) {
            let _ = self.out.write_all(delta.as_bytes());
            let _ = self.out.flush();
        }
        self.streaming = Some((id, text.len()));
    }

    fn on_streaming_complete(&mut self, id: Uuid) {
        if self.is_streaming(id) {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
        self.streaming = None;
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.err, "Error: {}", message);
        let _ = self.err.flush();
    }

    fn on_image_generated(&mut self, image: &ImageHandle) {
        if image.is_inline() {
            let _ = writeln!(
                self.out,
                "Generated image (inline, {} KB; /export keeps it)",
                image.url.len() / 1024
            );
        } else {
            let _ = writeln!(self.out, "Generated image: {}", image.url);
        }
        if let Some(revised) = &image.revised_prompt {
            let _ = writeln!(self.out, "Revised prompt: {}", revised);
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::ImageRef;

    fn presenter() -> ConsolePresenter<Vec<u8>, Vec<u8>> {
        ConsolePresenter::new(Vec::new(), Vec::new())
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn streamed_reply_is_printed_once() {
        let mut p = presenter();
        let id = Uuid::new_v4();
        p.on_streaming_update(id, "Hel");
        p.on_streaming_update(id, "Hello");
        let entry = ConversationEntry::with_id(id, Role::Assistant, EntryContent::Text("Hello".into()));
        p.on_message_appended(&entry);
        p.on_streaming_complete(id);

        let (out, err) = p.into_parts();
        assert_eq!(text(out), "Hello\n");
        assert!(err.is_empty());
    }

    #[test]
    fn complete_reply_is_printed_with_newline() {
        let mut p = presenter();
        p.on_message_appended(&ConversationEntry::assistant(EntryContent::Text("Hi".into())));
        assert_eq!(text(p.into_parts().0), "Hi\n");
    }

    #[test]
    fn user_text_is_not_echoed_but_attachments_are_noted() {
        let mut p = presenter();
        p.on_message_appended(&ConversationEntry::user(
            "hello",
            vec![ImageRef {
                name: "cat.png".into(),
                size_bytes: 2048,
            }],
        ));
        let (out, err) = p.into_parts();
        assert!(out.is_empty());
        assert_eq!(text(err), "[attached cat.png (2 KB)]\n");
    }

    #[test]
    fn errors_go_to_stderr() {
        let mut p = presenter();
        p.on_error("An error occurred. Network connection issue.");
        let (out, err) = p.into_parts();
        assert!(out.is_empty());
        assert_eq!(text(err), "Error: An error occurred. Network connection issue.\n");
    }

    #[test]
    fn generated_image_prints_url_once() {
        let mut p = presenter();
        let handle = ImageHandle {
            url: "https://img.example/fox.png".into(),
            revised_prompt: None,
        };
        p.on_image_generated(&handle);
        p.on_message_appended(&ConversationEntry::assistant(EntryContent::Image(handle)));
        assert_eq!(text(p.into_parts().0), "Generated image: https://img.example/fox.png\n");
    }
}
