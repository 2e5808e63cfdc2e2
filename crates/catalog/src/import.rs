use std::io;
use std::path::{Path, PathBuf};

use common::{default_extensions, is_supported_extension, MediaDraft, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use metadata::{clean_value, read_tags};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{Catalog, CatalogError};

#[derive(Clone, Debug)]
pub struct ImportOptions {
    pub recursive: bool,
    pub read_tags: bool,
    pub extensions: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            read_tags: false,
            extensions: default_extensions(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn import_folder(
    catalog: &Catalog,
    folder: &Path,
    options: &ImportOptions,
) -> Result<ImportReport, CatalogError> {
    if !folder.is_dir() {
        return Err(CatalogError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("folder not found: {}", folder.display()),
        )));
    }

    let mut report = ImportReport::default();
    for path in audio_candidates(folder, options.recursive) {
        if !is_supported_extension(&path, &options.extensions) {
            debug!("Skipping unsupported file {:?}", path);
            report.skipped += 1;
            continue;
        }

        let draft = build_draft(&path, options.read_tags);
        match catalog.insert(draft) {
            Ok(Some(_)) => report.imported += 1,
            Ok(None) => report.skipped += 1,
            Err(err) => {
                warn!("Failed to import {:?}: {}", path, err);
                report.failed += 1;
            }
        }
    }

    info!(
        "Imported {} files from {:?} ({} skipped, {} failed)",
        report.imported, folder, report.skipped, report.failed
    );
    Ok(report)
}

/// Splits `Artist - Title` on the first dash. Without a dash the whole stem
/// is the title and the artist is unknown.
pub fn parse_file_name(stem: &str) -> (String, String) {
    match stem.split_once('-') {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            (artist.trim().to_string(), title.trim().to_string())
        }
        _ => (UNKNOWN_ARTIST.to_string(), stem.trim().to_string()),
    }
}

fn audio_candidates(folder: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .follow_links(false)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => warn!("Failed to read entry under {:?}: {}", folder, err),
        }
    }
    files.sort();
    files
}

fn build_draft(path: &Path, with_tags: bool) -> MediaDraft {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let (artist, title) = parse_file_name(&stem);
    let mut draft = MediaDraft {
        title,
        artist,
        album: Some(UNKNOWN_ALBUM.to_string()),
        file_path: path.to_string_lossy().to_string(),
    };

    if with_tags {
        match read_tags(path) {
            Ok(tags) => {
                if let Some(title) = tags.title {
                    draft.title = title;
                }
                if let Some(artist) = tags.artist {
                    draft.artist = artist;
                }
                if let Some(album) = tags.album {
                    draft.album = Some(album);
                }
            }
            Err(err) => debug!("No tags for {:?}: {}", path, err),
        }
    }

    if let Some(title) = clean_value(&draft.title) {
        draft.title = title;
    }
    if let Some(artist) = clean_value(&draft.artist) {
        draft.artist = artist;
    }
    draft
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::UNKNOWN_ARTIST;
    use tempfile::TempDir;

    use super::{import_folder, parse_file_name, ImportOptions, ImportReport};
    use crate::{Catalog, CatalogError};

    fn setup() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(&dir.path().join("catalog.redb")).unwrap();
        (dir, catalog)
    }

    #[test]
    fn parses_artist_and_title() {
        assert_eq!(
            parse_file_name("Daft Punk - One More Time"),
            ("Daft Punk".to_string(), "One More Time".to_string())
        );
        assert_eq!(
            parse_file_name("A-ha - Take On Me"),
            ("A".to_string(), "ha - Take On Me".to_string())
        );
        assert_eq!(
            parse_file_name("Untitled"),
            (UNKNOWN_ARTIST.to_string(), "Untitled".to_string())
        );
        assert_eq!(
            parse_file_name("-intro"),
            (UNKNOWN_ARTIST.to_string(), "-intro".to_string())
        );
    }

    #[test]
    fn imports_flat_folder() {
        let (dir, catalog) = setup();
        let music = dir.path().join("music");
        fs::create_dir_all(music.join("nested")).unwrap();
        fs::write(music.join("Artist - One.mp3"), b"1").unwrap();
        fs::write(music.join("Artist - Two.FLAC"), b"2").unwrap();
        fs::write(music.join("cover.jpg"), b"x").unwrap();
        fs::write(music.join("nested").join("Artist - Three.mp3"), b"3").unwrap();

        let report = import_folder(&catalog, &music, &ImportOptions::default()).unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 2,
                skipped: 1,
                failed: 0
            }
        );

        let page = catalog.list_page(1, 10).unwrap();
        let mut titles: Vec<_> = page.items.iter().map(|r| r.title.clone()).collect();
        titles.sort();
        assert_eq!(titles, vec!["One", "Two"]);
        assert!(page.items.iter().all(|r| r.artist == "Artist"));
        assert!(page.items.iter().all(|r| r.album.as_deref() == Some("Unknown Album")));
    }

    #[test]
    fn recursive_import_descends_and_skips_duplicates() {
        let (dir, catalog) = setup();
        let music = dir.path().join("music");
        fs::create_dir_all(music.join("disc2")).unwrap();
        fs::write(music.join("Band - Song.ogg"), b"1").unwrap();
        fs::write(music.join("disc2").join("Band - Song.wav"), b"2").unwrap();
        fs::write(music.join("disc2").join("Band - Other.m4a"), b"3").unwrap();

        let options = ImportOptions {
            recursive: true,
            read_tags: true,
            ..ImportOptions::default()
        };
        let report = import_folder(&catalog, &music, &options).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);

        let again = import_folder(&catalog, &music, &options).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 3);
    }

    #[cfg(unix)]
    #[test]
    fn separators_are_cleaned_from_artist_and_title() {
        let (dir, catalog) = setup();
        let music = dir.path().join("music");
        fs::create_dir_all(&music).unwrap();
        fs::write(music.join("AC\\DC - Back\\In Black.mp3"), b"1").unwrap();

        let report = import_folder(&catalog, &music, &ImportOptions::default()).unwrap();
        assert_eq!(report.imported, 1);
        let record = catalog.list_all().unwrap().remove(0);
        assert_eq!(record.artist, "AC-DC");
        assert_eq!(record.title, "Back-In Black");
    }

    #[test]
    fn missing_folder_is_an_error() {
        let (dir, catalog) = setup();
        let err = import_folder(&catalog, &dir.path().join("nope"), &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
