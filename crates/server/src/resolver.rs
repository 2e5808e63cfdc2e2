use std::path::PathBuf;

use catalog::{Catalog, PathResolver};
use tracing::warn;

/// Maps a media identifier to a filesystem path. `None` means not found;
/// implementations never fail for an unknown identifier. The returned path
/// is only a hint: callers must still check it can be opened. Lookups may
/// block, so callers run them on the blocking pool.
pub trait MediaResolver: Send + Sync {
    fn resolve(&self, media_id: &str) -> Option<PathBuf>;
}

pub struct CatalogResolver {
    catalog: Catalog,
    paths: PathResolver,
}

impl CatalogResolver {
    pub fn new(catalog: Catalog, paths: PathResolver) -> Self {
        Self { catalog, paths }
    }
}

impl MediaResolver for CatalogResolver {
    fn resolve(&self, media_id: &str) -> Option<PathBuf> {
        let record = match self.catalog.get(media_id) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                warn!("Catalog lookup for {} failed: {}", media_id, err);
                return None;
            }
        };
        self.paths.resolve(&record.file_path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use catalog::{Catalog, PathResolver};
    use common::MediaDraft;
    use tempfile::TempDir;

    use super::{CatalogResolver, MediaResolver};

    #[test]
    fn resolves_catalogued_files_only() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(&dir.path().join("catalog.redb")).unwrap();
        let media = dir.path().join("media");
        fs::create_dir_all(&media).unwrap();
        fs::write(media.join("a.mp3"), b"abc").unwrap();

        let present = catalog
            .insert(MediaDraft {
                title: "A".to_string(),
                artist: "X".to_string(),
                album: None,
                file_path: "C:\\Users\\old\\a.mp3".to_string(),
            })
            .unwrap()
            .unwrap();
        let gone = catalog
            .insert(MediaDraft {
                title: "B".to_string(),
                artist: "X".to_string(),
                album: None,
                file_path: "/elsewhere/b.mp3".to_string(),
            })
            .unwrap()
            .unwrap();

        let resolver = CatalogResolver::new(catalog, PathResolver::new(Some(media.clone())));
        assert_eq!(resolver.resolve(&present.id), Some(media.join("a.mp3")));
        assert_eq!(resolver.resolve(&gone.id), None);
        assert_eq!(resolver.resolve("unknown"), None);
    }
}
