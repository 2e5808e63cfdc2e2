use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let mut info = TagInfo::default();
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        info.title = tag.get_string(&ItemKey::TrackTitle).and_then(clean_value);
        info.album = tag.get_string(&ItemKey::AlbumTitle).and_then(clean_value);
        let track_artist = tag.get_string(&ItemKey::TrackArtist).and_then(clean_value);
        let album_artist = tag.get_string(&ItemKey::AlbumArtist).and_then(clean_value);
        info.artist = track_artist.or(album_artist);
    }

    Ok(info)
}

/// Trims a tag value and replaces path separators so the value can never be
/// mistaken for a path fragment. Blank values count as missing.
pub fn clean_value(value: &str) -> Option<String> {
    let cleaned = value.trim().replace(['/', '\\'], "-");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{clean_value, read_tags};

    #[test]
    fn clean_value_replaces_separators() {
        assert_eq!(clean_value("  AC/DC \\ live "), Some("AC-DC - live".to_string()));
        assert_eq!(clean_value("   "), None);
    }

    #[test]
    fn read_tags_rejects_non_audio() {
        let mut file = tempfile::Builder::new().suffix(".flac").tempfile().unwrap();
        file.write_all(b"definitely not a flac stream").unwrap();
        assert!(read_tags(file.path()).is_err());
    }
}
