use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use catalog::{Catalog, ImportReport};
use common::MediaRecord;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<ServerConfig>,
    pub media_root: Option<PathBuf>,
    pub import_status: Arc<RwLock<ImportStatus>>,
}

#[derive(Clone, Debug)]
pub enum ImportStatus {
    Idle,
    Running { folder: PathBuf, started: u64 },
    Finished { folder: PathBuf, report: ImportReport, finished: u64 },
    Failed { folder: PathBuf, message: String },
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub num_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Serialize, Clone, Debug)]
pub struct MusicView {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub file_path: String,
    pub created_at: u64,
    pub stream_url: String,
}

impl From<MediaRecord> for MusicView {
    fn from(record: MediaRecord) -> Self {
        let stream_url = format!("/media/{}", record.id);
        Self {
            id: record.id,
            title: record.title,
            artist: record.artist,
            album: record.album,
            file_path: record.file_path,
            created_at: record.created_at,
            stream_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub folder: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub read_tags: bool,
}

#[derive(Serialize)]
pub struct ImportStatusResponse {
    pub status: &'static str,
    pub folder: Option<String>,
    pub report: Option<ImportReport>,
    pub message: Option<String>,
    pub updated_at: Option<u64>,
}

impl From<&ImportStatus> for ImportStatusResponse {
    fn from(status: &ImportStatus) -> Self {
        match status {
            ImportStatus::Idle => Self {
                status: "idle",
                folder: None,
                report: None,
                message: None,
                updated_at: None,
            },
            ImportStatus::Running { folder, started } => Self {
                status: "running",
                folder: Some(folder.display().to_string()),
                report: None,
                message: None,
                updated_at: Some(*started),
            },
            ImportStatus::Finished {
                folder,
                report,
                finished,
            } => Self {
                status: "finished",
                folder: Some(folder.display().to_string()),
                report: Some(report.clone()),
                message: None,
                updated_at: Some(*finished),
            },
            ImportStatus::Failed { folder, message } => Self {
                status: "failed",
                folder: Some(folder.display().to_string()),
                report: None,
                message: Some(message.clone()),
                updated_at: None,
            },
        }
    }
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
