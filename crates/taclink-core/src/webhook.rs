use anyhow::Result;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::message::Mode;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    message: &'a str,
    mode: Mode,
}

/// Optional-field JSON envelope the endpoint may answer with. An envelope
/// carrying none of the fields is reported to the user as a response
/// without valid content.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    pub reply: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
}

impl Envelope {
    pub fn is_empty(&self) -> bool {
        self.reply.is_none() && self.image.is_none() && self.video.is_none()
    }
}

/// One webhook response, decided exactly once from the declared content
/// type. Binary payloads are never run through the JSON parser.
#[derive(Debug)]
pub enum Reply {
    Image { content_type: String, bytes: Vec<u8> },
    Video { content_type: String, bytes: Vec<u8> },
    Envelope(Envelope),
}

/// Non-2xx response, carrying the status and the best-effort body text.
#[derive(Debug, Error)]
#[error("status {status}: {body}")]
pub struct RequestError {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// POSTs one prompt to the endpoint and resolves the response into a
    /// tagged `Reply`.
    pub async fn generate(&self, endpoint: &str, prompt: &str, mode: Mode) -> Result<Reply> {
        debug!(endpoint, %mode, "issuing generation request");

        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, "application/json, image/*, video/*")
            .json(&GenerateRequest {
                message: prompt,
                mode,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = if body.is_empty() {
                "unknown error".to_string()
            } else {
                body
            };
            return Err(RequestError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("image/") {
            let bytes = response.bytes().await?.to_vec();
            debug!(len = bytes.len(), "binary image response");
            Ok(Reply::Image {
                content_type,
                bytes,
            })
        } else if content_type.contains("video/") {
            let bytes = response.bytes().await?.to_vec();
            debug!(len = bytes.len(), "binary video response");
            Ok(Reply::Video {
                content_type,
                bytes,
            })
        } else {
            let bytes = response.bytes().await?;
            let envelope: Envelope = serde_json::from_slice(&bytes)?;
            debug!(?envelope, "json envelope response");
            Ok(Reply::Envelope(envelope))
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}
