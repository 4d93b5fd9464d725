use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Generation hint sent alongside every prompt. The endpoint may honor or
/// ignore it; local message handling never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Image,
    Video,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Image => "image",
            Mode::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image" => Some(Mode::Image),
            "video" => Some(Mode::Video),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Mode::Image => Mode::Video,
            Mode::Video => Mode::Image,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A displayable reference to media carried by a message. Envelope replies
/// point at remote URLs; binary replies are materialized into session-scoped
/// files by the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Url(String),
    File(PathBuf),
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Url(url) => f.write_str(url),
            MediaRef::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One entry in the conversation. The list is append-only for the life of a
/// session; entries are never mutated or removed.
#[derive(Debug, Clone)]
pub struct Message {
    pub text: Option<String>,
    pub image: Option<MediaRef>,
    pub video: Option<MediaRef>,
    pub is_user: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
            video: None,
            is_user: true,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
            video: None,
            is_user: false,
        }
    }
}
