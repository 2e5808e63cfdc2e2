mod import;
mod resolve;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use common::{stable_id, MediaDraft, MediaRecord};
use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition,
    TableError, TransactionError,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use import::{import_folder, parse_file_name, ImportOptions, ImportReport};
pub use resolve::{PathResolver, Repair};

const KEY_SEP: char = '\x1f';

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const MEDIA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("media");
const MEDIA_BY_SEQ_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("media_by_seq");
const MEDIA_BY_NAME_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("media_by_name");

const META_SEQ_KEY: &str = "seq";

#[derive(Clone)]
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let db = open_or_create_db(path)?;
        let catalog = Self { db: Arc::new(db) };
        catalog.init_tables()?;
        info!("Opened catalog at {:?}", path);
        Ok(catalog)
    }

    fn init_tables(&self) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write()?;
        {
            write_txn.open_table(META_TABLE)?;
            write_txn.open_table(MEDIA_TABLE)?;
            write_txn.open_table(MEDIA_BY_SEQ_TABLE)?;
            write_txn.open_table(MEDIA_BY_NAME_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Stores a new record. Returns `None` when the same file, or a track
    /// with the same artist and title, is already catalogued.
    pub fn insert(&self, draft: MediaDraft) -> Result<Option<MediaRecord>, CatalogError> {
        let id = stable_id(&draft.file_path);
        let name_key = name_key(&draft.artist, &draft.title);

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut media = write_txn.open_table(MEDIA_TABLE)?;
            let mut by_name = write_txn.open_table(MEDIA_BY_NAME_TABLE)?;
            if media.get(id.as_str())?.is_some() || by_name.get(name_key.as_str())?.is_some() {
                return Ok(None);
            }

            let mut meta = write_txn.open_table(META_TABLE)?;
            let seq = match meta.get(META_SEQ_KEY)? {
                Some(value) => decode_value::<u64>(value.value())?,
                None => 0,
            } + 1;
            meta.insert(META_SEQ_KEY, encode_value(&seq)?.as_slice())?;

            let record = MediaRecord {
                id: id.clone(),
                title: draft.title,
                artist: draft.artist,
                album: draft.album,
                file_path: draft.file_path,
                created_at: now_millis(),
            };
            let stored = StoredRecord { seq, record };
            media.insert(id.as_str(), encode_value(&stored)?.as_slice())?;
            by_name.insert(name_key.as_str(), id.as_bytes())?;
            let mut by_seq = write_txn.open_table(MEDIA_BY_SEQ_TABLE)?;
            by_seq.insert(seq_key(seq, &id).as_str(), id.as_bytes())?;
            stored.record
        };
        write_txn.commit()?;
        Ok(Some(record))
    }

    pub fn get(&self, id: &str) -> Result<Option<MediaRecord>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let media = read_txn.open_table(MEDIA_TABLE)?;
        let record = match media.get(id)? {
            Some(value) => Some(decode_value::<StoredRecord>(value.value())?.record),
            None => None,
        };
        Ok(record)
    }

    pub fn count(&self) -> Result<usize, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let media = read_txn.open_table(MEDIA_TABLE)?;
        Ok(media.len()? as usize)
    }

    /// Newest-first page. `page` is 1-based; anything outside
    /// `1..=num_pages` lands on the last page.
    pub fn list_page(&self, page: usize, per_page: usize) -> Result<Page<MediaRecord>, CatalogError> {
        let per_page = per_page.max(1);
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(MEDIA_BY_SEQ_TABLE)?;
        let media = read_txn.open_table(MEDIA_TABLE)?;

        let total = by_seq.len()? as usize;
        let num_pages = total.div_ceil(per_page).max(1);
        let page = if page == 0 || page > num_pages {
            num_pages
        } else {
            page
        };
        let offset = (page - 1) * per_page;

        let mut items = Vec::with_capacity(per_page.min(total));
        for entry in by_seq.iter()?.rev().skip(offset).take(per_page) {
            let entry = entry?;
            let (_, id) = split_key_last(entry.0.value())?;
            if let Some(value) = media.get(id)? {
                items.push(decode_value::<StoredRecord>(value.value())?.record);
            }
        }

        Ok(Page {
            items,
            page,
            per_page,
            total,
            num_pages,
        })
    }

    /// Every record, oldest first.
    pub fn list_all(&self) -> Result<Vec<MediaRecord>, CatalogError> {
        let read_txn = self.db.begin_read()?;
        let by_seq = read_txn.open_table(MEDIA_BY_SEQ_TABLE)?;
        let media = read_txn.open_table(MEDIA_TABLE)?;

        let mut items = Vec::new();
        for entry in by_seq.iter()? {
            let entry = entry?;
            let (_, id) = split_key_last(entry.0.value())?;
            if let Some(value) = media.get(id)? {
                items.push(decode_value::<StoredRecord>(value.value())?.record);
            }
        }
        Ok(items)
    }

    /// Rewrites the stored path of an existing record. The identifier does
    /// not change. Returns `false` when the record is unknown.
    pub fn update_path(&self, id: &str, file_path: &str) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut media = write_txn.open_table(MEDIA_TABLE)?;
            let mut stored = match media.get(id)? {
                Some(value) => decode_value::<StoredRecord>(value.value())?,
                None => return Ok(false),
            };
            stored.record.file_path = file_path.to_string();
            media.insert(id, encode_value(&stored)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(true)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub num_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredRecord {
    seq: u64,
    record: MediaRecord,
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    KeyParse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "io error: {}", err),
            CatalogError::Redb(err) => write!(f, "db error: {}", err),
            CatalogError::Bincode(err) => write!(f, "bincode error: {}", err),
            CatalogError::KeyParse(value) => write!(f, "key parse error: {}", value),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<redb::Error> for CatalogError {
    fn from(err: redb::Error) -> Self {
        CatalogError::Redb(err)
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TableError> for CatalogError {
    fn from(err: TableError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<TransactionError> for CatalogError {
    fn from(err: TransactionError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<CommitError> for CatalogError {
    fn from(err: CommitError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for CatalogError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        CatalogError::Bincode(err)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

fn name_key(artist: &str, title: &str) -> String {
    let mut out = artist.trim().to_lowercase();
    out.push(KEY_SEP);
    out.push_str(&title.trim().to_lowercase());
    out
}

fn seq_key(seq: u64, id: &str) -> String {
    format!("{:020}{}{}", seq, KEY_SEP, id)
}

fn split_key_last(value: &str) -> Result<(&str, &str), CatalogError> {
    let idx = value
        .rfind(KEY_SEP)
        .ok_or_else(|| CatalogError::KeyParse(value.to_string()))?;
    let next = idx + KEY_SEP.len_utf8();
    Ok((&value[..idx], &value[next..]))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use common::MediaDraft;
    use tempfile::TempDir;

    use super::{Catalog, seq_key, split_key_last};

    fn draft(artist: &str, title: &str, path: &str) -> MediaDraft {
        MediaDraft {
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            file_path: path.to_string(),
        }
    }

    fn open_temp() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(&dir.path().join("db").join("catalog.redb")).unwrap();
        (dir, catalog)
    }

    #[test]
    fn seq_keys_sort_numerically() {
        assert!(seq_key(9, "b") < seq_key(10, "a"));
        let key = seq_key(42, "abc");
        assert_eq!(split_key_last(&key).unwrap().1, "abc");
    }

    #[test]
    fn insert_and_get() {
        let (_dir, catalog) = open_temp();
        let record = catalog
            .insert(draft("Artist", "Song", "/music/Artist - Song.mp3"))
            .unwrap()
            .unwrap();
        let loaded = catalog.get(&record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(catalog.count().unwrap(), 1);
        assert!(catalog.get("missing").unwrap().is_none());
    }

    #[test]
    fn duplicates_are_skipped() {
        let (_dir, catalog) = open_temp();
        assert!(catalog.insert(draft("A", "Song", "/a.mp3")).unwrap().is_some());
        // same artist + title, different file
        assert!(catalog.insert(draft(" a ", "SONG", "/b.mp3")).unwrap().is_none());
        // same file
        assert!(catalog.insert(draft("B", "Other", "/a.mp3")).unwrap().is_none());
        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn pages_are_newest_first() {
        let (_dir, catalog) = open_temp();
        for idx in 0..5 {
            catalog
                .insert(draft("A", &format!("Song {}", idx), &format!("/{}.mp3", idx)))
                .unwrap();
        }

        let first = catalog.list_page(1, 2).unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.num_pages, 3);
        let titles: Vec<_> = first.items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Song 4", "Song 3"]);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = catalog.list_page(3, 2).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].title, "Song 0");
        assert!(!last.has_next());
    }

    #[test]
    fn out_of_range_page_lands_on_last_page() {
        let (_dir, catalog) = open_temp();
        for idx in 0..3 {
            catalog
                .insert(draft("A", &format!("Song {}", idx), &format!("/{}.mp3", idx)))
                .unwrap();
        }
        assert_eq!(catalog.list_page(99, 2).unwrap().page, 2);
        assert_eq!(catalog.list_page(0, 2).unwrap().page, 2);
    }

    #[test]
    fn empty_catalog_has_one_page() {
        let (_dir, catalog) = open_temp();
        let page = catalog.list_page(1, 50).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn update_path_keeps_id() {
        let (_dir, catalog) = open_temp();
        let record = catalog.insert(draft("A", "Song", "D:\\music\\a.mp3")).unwrap().unwrap();
        assert!(catalog.update_path(&record.id, "/music/a.mp3").unwrap());
        let loaded = catalog.get(&record.id).unwrap().unwrap();
        assert_eq!(loaded.file_path, "/music/a.mp3");
        assert!(!catalog.update_path("missing", "/x.mp3").unwrap());

        let all = catalog.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, record.id);
    }

    #[test]
    fn reopening_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.redb");
        {
            let catalog = Catalog::open(&path).unwrap();
            catalog.insert(draft("A", "Song", "/a.mp3")).unwrap();
        }
        let catalog = Catalog::open(&path).unwrap();
        assert_eq!(catalog.count().unwrap(), 1);
        catalog.insert(draft("A", "Song 2", "/b.mp3")).unwrap();
        let page = catalog.list_page(1, 10).unwrap();
        assert_eq!(page.items[0].title, "Song 2");
    }
}
