use anyhow::Result;
use tracing::{info, warn};

use crate::media::MediaStore;
use crate::message::{MediaRef, Message, Mode};
use crate::webhook::Reply;

pub const SEED_MESSAGE: &str = "UNLEASH YOUR IMAGINATION. DESCRIBE ANYTHING...";

const IMAGE_LABEL: &str = "IMAGE RECEIVED // TACTICAL_DATA";
const VIDEO_LABEL: &str = "VIDEO RECEIVED // TACTICAL_DATA";
const NO_CONTENT_MESSAGE: &str = "SYSTEM: RESPONSE RECEIVED BUT NO VALID CONTENT.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    AwaitingResponse,
}

/// Owns the conversation: the append-only message list and the two-state
/// request cycle (`Idle` ⇄ `AwaitingResponse`).
///
/// `submit` is the only way into `AwaitingResponse` and it refuses to fire
/// while a request is outstanding, so at most one request is ever in flight
/// per engine regardless of how fast the caller pushes submissions.
/// `settle` is the only way back to `Idle` and always appends exactly one
/// system message for the outcome.
pub struct ConversationEngine {
    messages: Vec<Message>,
    state: EngineState,
    endpoint_url: String,
    mode: Mode,
    media: MediaStore,
}

impl ConversationEngine {
    pub fn new(endpoint_url: String, mode: Mode) -> Result<Self> {
        Ok(Self {
            messages: vec![Message::system(SEED_MESSAGE)],
            state: EngineState::Idle,
            endpoint_url,
            mode,
            media: MediaStore::new()?,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        self.state == EngineState::AwaitingResponse
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Accepts one submission. Returns the trimmed prompt for the caller to
    /// dispatch, or `None` when the input is blank or a request is already
    /// in flight. Blank input causes no state change and no message.
    pub fn submit(&mut self, input: &str) -> Option<String> {
        if self.state == EngineState::AwaitingResponse {
            warn!("submission rejected: request already in flight");
            return None;
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.messages.push(Message::user(trimmed));
        self.state = EngineState::AwaitingResponse;
        info!(mode = %self.mode, "prompt accepted");
        Some(trimmed.to_string())
    }

    /// Completes the in-flight cycle: appends exactly one system message
    /// derived from the outcome and returns to idle. Runs unconditionally,
    /// whatever the outcome was.
    pub fn settle(&mut self, outcome: Result<Reply>) {
        let message = match outcome {
            Ok(reply) => self.message_for_reply(reply),
            Err(err) => connection_error(&err.to_string()),
        };
        self.messages.push(message);
        self.state = EngineState::Idle;
    }

    /// Applies a confirmed settings change as the new active endpoint and
    /// records it in the conversation. Persisting the value is the caller's
    /// job.
    pub fn update_endpoint(&mut self, url: String) {
        info!(endpoint = %url, "endpoint updated");
        self.messages.push(Message::system(format!(
            "CONFIGURATION UPDATED: ENDPOINT SET TO {url}"
        )));
        self.endpoint_url = url;
    }

    fn message_for_reply(&mut self, reply: Reply) -> Message {
        match reply {
            Reply::Image {
                content_type,
                bytes,
            } => match self.media.store(&content_type, &bytes) {
                Ok(path) => Message {
                    text: Some(IMAGE_LABEL.to_string()),
                    image: Some(MediaRef::File(path)),
                    video: None,
                    is_user: false,
                },
                Err(err) => connection_error(&err.to_string()),
            },
            Reply::Video {
                content_type,
                bytes,
            } => match self.media.store(&content_type, &bytes) {
                Ok(path) => Message {
                    text: Some(VIDEO_LABEL.to_string()),
                    image: None,
                    video: Some(MediaRef::File(path)),
                    is_user: false,
                },
                Err(err) => connection_error(&err.to_string()),
            },
            Reply::Envelope(envelope) => {
                if envelope.is_empty() {
                    Message::system(NO_CONTENT_MESSAGE)
                } else {
                    Message {
                        text: envelope.reply,
                        image: envelope.image.map(MediaRef::Url),
                        video: envelope.video.map(MediaRef::Url),
                        is_user: false,
                    }
                }
            }
        }
    }
}

fn connection_error(detail: &str) -> Message {
    Message::system(format!(
        "CONNECTION ERROR: {detail}. ENSURE THE ENDPOINT IS ACTIVE."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::{Envelope, RequestError};
    use anyhow::anyhow;

    fn engine() -> ConversationEngine {
        ConversationEngine::new("http://127.0.0.1:1/hook".to_string(), Mode::Image).unwrap()
    }

    #[test]
    fn test_starts_idle_with_seed_message() {
        let engine = engine();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.messages().len(), 1);
        assert!(!engine.messages()[0].is_user);
        assert_eq!(engine.messages()[0].text.as_deref(), Some(SEED_MESSAGE));
    }

    #[test]
    fn test_submit_appends_user_message_and_awaits() {
        let mut engine = engine();
        let prompt = engine.submit("  a neon city at dusk  ").unwrap();

        assert_eq!(prompt, "a neon city at dusk");
        assert!(engine.is_waiting());
        assert_eq!(engine.messages().len(), 2);

        let last = engine.messages().last().unwrap();
        assert!(last.is_user);
        assert_eq!(last.text.as_deref(), Some("a neon city at dusk"));
    }

    #[test]
    fn test_blank_submission_is_silently_ignored() {
        let mut engine = engine();
        assert!(engine.submit("").is_none());
        assert!(engine.submit("   \t\n ").is_none());
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.messages().len(), 1);
    }

    #[test]
    fn test_single_flight_rejects_second_submission() {
        let mut engine = engine();
        assert!(engine.submit("first").is_some());
        assert!(engine.submit("second").is_none());
        // Only seed + first user message, nothing for the rejected one
        assert_eq!(engine.messages().len(), 2);
    }

    #[test]
    fn test_round_trip_adds_exactly_two_messages() {
        let mut engine = engine();
        let before = engine.messages().len();

        engine.submit("hello").unwrap();
        engine.settle(Ok(Reply::Envelope(Envelope {
            reply: Some("hi there".to_string()),
            ..Default::default()
        })));

        assert_eq!(engine.messages().len(), before + 2);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_settle_envelope_reply() {
        let mut engine = engine();
        engine.submit("hello").unwrap();
        engine.settle(Ok(Reply::Envelope(Envelope {
            reply: Some("hello".to_string()),
            ..Default::default()
        })));

        let last = engine.messages().last().unwrap();
        assert!(!last.is_user);
        assert_eq!(last.text.as_deref(), Some("hello"));
        assert!(last.image.is_none());
        assert!(last.video.is_none());
    }

    #[test]
    fn test_settle_envelope_with_media_urls() {
        let mut engine = engine();
        engine.submit("fox").unwrap();
        engine.settle(Ok(Reply::Envelope(Envelope {
            reply: None,
            image: Some("https://cdn.example.com/fox.png".to_string()),
            video: None,
        })));

        let last = engine.messages().last().unwrap();
        assert!(last.text.is_none());
        assert_eq!(
            last.image,
            Some(MediaRef::Url("https://cdn.example.com/fox.png".to_string()))
        );
    }

    #[test]
    fn test_settle_empty_envelope_uses_fallback() {
        let mut engine = engine();
        engine.submit("hello").unwrap();
        engine.settle(Ok(Reply::Envelope(Envelope::default())));

        let last = engine.messages().last().unwrap();
        assert_eq!(last.text.as_deref(), Some(NO_CONTENT_MESSAGE));
    }

    #[test]
    fn test_settle_binary_image_stores_file() {
        let mut engine = engine();
        engine.submit("a fox").unwrap();
        engine.settle(Ok(Reply::Image {
            content_type: "image/png".to_string(),
            bytes: b"png payload".to_vec(),
        }));

        let last = engine.messages().last().unwrap();
        assert_eq!(last.text.as_deref(), Some(IMAGE_LABEL));
        assert!(last.video.is_none());

        match &last.image {
            Some(MediaRef::File(path)) => {
                assert!(path.exists());
                assert_eq!(std::fs::read(path).unwrap(), b"png payload");
            }
            other => panic!("expected stored file reference, got {other:?}"),
        }
    }

    #[test]
    fn test_settle_binary_video_stores_file() {
        let mut engine = engine();
        engine.submit("a fox running").unwrap();
        engine.settle(Ok(Reply::Video {
            content_type: "video/mp4".to_string(),
            bytes: b"mp4 payload".to_vec(),
        }));

        let last = engine.messages().last().unwrap();
        assert_eq!(last.text.as_deref(), Some(VIDEO_LABEL));
        assert!(last.image.is_none());
        assert!(matches!(last.video, Some(MediaRef::File(_))));
    }

    #[test]
    fn test_settle_http_error_surfaces_status_and_body() {
        let mut engine = engine();
        engine.submit("hello").unwrap();
        engine.settle(Err(RequestError {
            status: 500,
            body: "boom".to_string(),
        }
        .into()));

        let last = engine.messages().last().unwrap();
        let text = last.text.as_deref().unwrap();
        assert!(text.starts_with("CONNECTION ERROR:"));
        assert!(text.contains("500"));
        assert!(text.contains("boom"));
        assert!(text.contains("ENSURE THE ENDPOINT IS ACTIVE."));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_settle_transport_error_surfaces_detail() {
        let mut engine = engine();
        engine.submit("hello").unwrap();
        engine.settle(Err(anyhow!("connection refused")));

        let last = engine.messages().last().unwrap();
        assert_eq!(
            last.text.as_deref(),
            Some("CONNECTION ERROR: connection refused. ENSURE THE ENDPOINT IS ACTIVE.")
        );
    }

    #[test]
    fn test_update_endpoint_records_verbatim_message() {
        let mut engine = engine();
        engine.update_endpoint("https://hooks.example.com/v2".to_string());

        assert_eq!(engine.endpoint_url(), "https://hooks.example.com/v2");
        let last = engine.messages().last().unwrap();
        assert_eq!(
            last.text.as_deref(),
            Some("CONFIGURATION UPDATED: ENDPOINT SET TO https://hooks.example.com/v2")
        );
        assert!(!last.is_user);
    }

    #[test]
    fn test_engine_cycles_for_many_round_trips() {
        let mut engine = engine();
        for i in 0..5 {
            engine.submit(format!("prompt {i}").as_str()).unwrap();
            engine.settle(Ok(Reply::Envelope(Envelope {
                reply: Some(format!("reply {i}")),
                ..Default::default()
            })));
        }
        // seed + 5 * (user + system)
        assert_eq!(engine.messages().len(), 11);
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
