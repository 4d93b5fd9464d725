use anyhow::Result;
use taclink_core::{Config, ConversationEngine, Message, Mode, Reply, WebhookClient};
use tokio::task::JoinHandle;
use tracing::warn;

/// Top-level UI state: the conversation engine plus everything the terminal
/// front-end needs around it (input buffers, overlay state, scroll, the
/// in-flight request task).
pub struct App {
    pub engine: ConversationEngine,
    pub config: Config,
    pub client: WebhookClient,

    // Input line state
    pub input: String,
    pub input_cursor: usize,

    // Settings overlay state
    pub show_settings: bool,
    pub settings_input: String,
    pub settings_cursor: usize,

    // Chat viewport state
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // At most one request is ever outstanding; the engine refuses further
    // submissions until this task has been settled.
    pub request_task: Option<JoinHandle<Result<Reply>>>,

    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, endpoint_override: Option<String>, mode: Mode) -> Result<Self> {
        let endpoint = endpoint_override.unwrap_or_else(|| config.endpoint_url.clone());
        let engine = ConversationEngine::new(endpoint, mode)?;

        Ok(Self {
            engine,
            config,
            client: WebhookClient::new(),
            input: String::new(),
            input_cursor: 0,
            show_settings: false,
            settings_input: String::new(),
            settings_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            request_task: None,
            should_quit: false,
        })
    }

    /// Hands the input line to the engine; on accept, clears the buffer and
    /// spawns the request task. Blank input and submissions while a request
    /// is in flight are ignored by the engine.
    pub fn submit_input(&mut self) {
        let Some(prompt) = self.engine.submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.input_cursor = 0;

        let client = self.client.clone();
        let endpoint = self.engine.endpoint_url().to_string();
        let mode = self.engine.mode();
        self.request_task = Some(tokio::spawn(async move {
            client.generate(&endpoint, &prompt, mode).await
        }));

        self.scroll_to_bottom();
    }

    /// Settles the request cycle once the spawned task has finished. Called
    /// every loop iteration; a no-op while the task is still running.
    pub async fn poll_request(&mut self) {
        let finished = self
            .request_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.request_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                // A panicked task still has to settle the cycle
                Err(err) => Err(anyhow::anyhow!(err)),
            };
            self.engine.settle(outcome);
            self.scroll_to_bottom();
        }
    }

    pub fn toggle_mode(&mut self) {
        self.engine.set_mode(self.engine.mode().toggle());
    }

    // Settings overlay

    pub fn open_settings(&mut self) {
        self.settings_input = self.engine.endpoint_url().to_string();
        self.settings_cursor = self.settings_input.chars().count();
        self.show_settings = true;
    }

    pub fn close_settings(&mut self) {
        self.show_settings = false;
        self.settings_input.clear();
        self.settings_cursor = 0;
    }

    /// Confirms the edited endpoint: applies it to the engine (which records
    /// the change in the conversation) and persists it.
    pub fn confirm_settings(&mut self) {
        let url = self.settings_input.trim().to_string();
        if url.is_empty() {
            return;
        }

        self.engine.update_endpoint(url.clone());
        self.config.endpoint_url = url;
        if let Err(err) = self.config.save() {
            warn!(%err, "failed to persist endpoint");
        }

        self.close_settings();
        self.scroll_to_bottom();
    }

    /// Restores the built-in default into the edit buffer. Nothing is
    /// persisted until the user confirms.
    pub fn reset_settings(&mut self) {
        self.settings_input = Config::reset();
        self.settings_cursor = self.settings_input.chars().count();
    }

    // Chat viewport

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max_scroll {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        self.chat_scroll = (self.chat_scroll + self.chat_height / 2).min(max_scroll);
    }

    /// Scroll so the newest message (and the waiting indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total.saturating_sub(visible);
    }

    /// Estimated rendered line count of the whole conversation, using the
    /// same wrap approximation as the renderer.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in self.engine.messages() {
            total = total.saturating_add(message_line_count(msg, wrap_width));
        }

        if self.engine.is_waiting() {
            total = total.saturating_add(2); // role line + "PROCESSING" line
        }

        total
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.engine.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// Lines one message occupies in the chat view: a role line, the wrapped
/// text lines, one line per media reference, and a trailing blank line.
pub fn message_line_count(msg: &Message, wrap_width: usize) -> u16 {
    let mut lines: u16 = 1; // role line

    if let Some(text) = &msg.text {
        for line in text.lines() {
            // Character count, not byte length, for proper UTF-8 handling
            let char_count = line.chars().count();
            if char_count == 0 {
                lines += 1;
            } else {
                lines += ((char_count / wrap_width.max(1)) + 1) as u16;
            }
        }
    }

    if msg.image.is_some() {
        lines += 1;
    }
    if msg.video.is_some() {
        lines += 1;
    }

    lines + 1 // blank line after message
}

#[cfg(test)]
mod tests {
    use super::*;
    use taclink_core::MediaRef;

    #[test]
    fn test_message_line_count_wraps_text() {
        let msg = Message::user("a".repeat(100));
        // role line + 3 wrapped lines (100 chars at width 40) + blank
        assert_eq!(message_line_count(&msg, 40), 5);
    }

    #[test]
    fn test_message_line_count_includes_media_lines() {
        let mut msg = Message::system("IMAGE RECEIVED // TACTICAL_DATA");
        msg.image = Some(MediaRef::Url("https://example.com/a.png".to_string()));
        // role + text + media + blank
        assert_eq!(message_line_count(&msg, 80), 4);
    }

    #[test]
    fn test_message_line_count_media_only() {
        let msg = Message {
            text: None,
            image: None,
            video: Some(MediaRef::Url("https://example.com/a.mp4".to_string())),
            is_user: false,
        };
        // role + media + blank
        assert_eq!(message_line_count(&msg, 80), 3);
    }
}
