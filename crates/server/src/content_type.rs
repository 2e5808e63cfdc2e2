use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use common::extension_lower;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

const AUDIO_CONTENT_TYPES: [(&str, &str); 7] = [
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("wma", "audio/x-ms-wma"),
];

/// Extension to MIME lookup. The built-in audio table wins over the
/// generic registry so the answer does not depend on platform databases.
#[derive(Clone, Debug)]
pub struct ContentTypes {
    table: HashMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl ContentTypes {
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let mut table: HashMap<String, String> = AUDIO_CONTENT_TYPES
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        for (ext, mime) in overrides {
            let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            let mime = mime.trim();
            if ext.is_empty() || mime.is_empty() {
                continue;
            }
            table.insert(ext, mime.to_string());
        }
        Self { table }
    }

    pub fn lookup(&self, path: &Path) -> &str {
        let ext = match extension_lower(path) {
            Some(ext) => ext,
            None => return FALLBACK_CONTENT_TYPE,
        };
        if let Some(mime) = self.table.get(&ext) {
            return mime;
        }
        match mime_guess::from_ext(&ext).first_raw() {
            Some(mime) if mime.starts_with("audio/") => mime,
            _ => FALLBACK_CONTENT_TYPE,
        }
    }
}
