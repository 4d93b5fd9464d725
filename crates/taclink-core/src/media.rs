use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Session-scoped store for binary reply payloads.
///
/// Every stored payload becomes a file inside one temporary directory, and
/// the returned path is what the conversation view renders. The directory
/// and everything in it is removed when the store is dropped, so transient
/// media lives exactly as long as the session that produced it.
pub struct MediaStore {
    dir: TempDir,
    sequence: u64,
}

impl MediaStore {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("taclink-media-")
            .tempdir()?;
        Ok(Self { dir, sequence: 0 })
    }

    /// Writes one payload and returns its path. The file extension comes
    /// from the declared content type, falling back to `bin` for types
    /// without a known extension.
    pub fn store(&mut self, content_type: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.sequence += 1;
        let name = format!("reply-{:04}.{}", self.sequence, extension_for(content_type));
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), len = bytes.len(), "stored media payload");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn extension_for(content_type: &str) -> &'static str {
    // Strip any parameters ("image/png; charset=...") before the lookup
    let essence = content_type.split(';').next().unwrap_or("").trim();
    mime_guess::get_mime_extensions_str(essence)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("bin")
}
