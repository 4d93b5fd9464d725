pub mod config;
pub mod engine;
pub mod media;
pub mod message;
pub mod webhook;

// Re-export main types for convenience
pub use config::{Config, DEFAULT_ENDPOINT};
pub use engine::{ConversationEngine, EngineState};
pub use media::MediaStore;
pub use message::{MediaRef, Message, Mode};
pub use webhook::{Envelope, Reply, RequestError, WebhookClient};
