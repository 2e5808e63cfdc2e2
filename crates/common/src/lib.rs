use serde::{Deserialize, Serialize};
use std::path::Path;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Extensions (lowercase, without the dot) accepted by the importer unless
/// the configuration says otherwise.
pub const DEFAULT_AUDIO_EXTENSIONS: [&str; 7] = ["mp3", "wav", "flac", "ogg", "m4a", "aac", "wma"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Path as it was stored at import time. It may no longer point at a real
    /// file; consumers resolve it before touching the filesystem.
    pub file_path: String,
    pub created_at: u64,
}

impl MediaRecord {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MediaDraft {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub file_path: String,
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Lowercased extension of `path`, without the leading dot.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_supported_extension(path: &Path, extensions: &[String]) -> bool {
    match extension_lower(path) {
        Some(ext) => extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

pub fn default_extensions() -> Vec<String> {
    DEFAULT_AUDIO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}
