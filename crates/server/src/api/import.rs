use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, http::StatusCode, Json};
use catalog::{import_folder, ImportOptions, ImportReport};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::state::{AppState, ImportRequest, ImportStatus, ImportStatusResponse, JsonResult};
use crate::utils::json_error;

pub async fn run_import(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> JsonResult<ImportReport> {
    let folder = import_folder_path(&state, &payload.folder);
    if payload.folder.trim().is_empty() || !folder.is_dir() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("folder not found: {}", payload.folder),
        ));
    }

    {
        let mut guard = state.import_status.write();
        if let ImportStatus::Running { folder, .. } = &*guard {
            return Err(json_error(
                StatusCode::CONFLICT,
                format!("import already running for {}", folder.display()),
            ));
        }
        *guard = ImportStatus::Running {
            folder: folder.clone(),
            started: now_secs(),
        };
    }
    info!("Import started for {:?}", folder);

    let options = ImportOptions {
        recursive: payload.recursive,
        read_tags: payload.read_tags,
        extensions: state.config.supported_extensions.clone(),
    };
    let catalog = state.catalog.clone();
    let status = state.import_status.clone();
    let job_folder = folder.clone();
    // The job records its own outcome; the request may be dropped before the
    // import finishes.
    let job = tokio::task::spawn_blocking(move || {
        let outcome = import_folder(&catalog, &job_folder, &options).map_err(|err| err.to_string());
        finish_import(&status, job_folder, &outcome);
        outcome
    });

    match job.await {
        Ok(Ok(report)) => Ok(Json(report)),
        Ok(Err(message)) => Err(json_error(StatusCode::INTERNAL_SERVER_ERROR, message)),
        Err(err) => {
            let message = format!("import task failed: {}", err);
            finish_import(&state.import_status, folder, &Err(message.clone()));
            Err(json_error(StatusCode::INTERNAL_SERVER_ERROR, message))
        }
    }
}

fn finish_import(
    status: &RwLock<ImportStatus>,
    folder: PathBuf,
    outcome: &Result<ImportReport, String>,
) {
    let next = match outcome {
        Ok(report) => ImportStatus::Finished {
            folder,
            report: report.clone(),
            finished: now_secs(),
        },
        Err(message) => {
            warn!("Import of {:?} failed: {}", folder, message);
            ImportStatus::Failed {
                folder,
                message: message.clone(),
            }
        }
    };
    *status.write() = next;
}

pub async fn import_status(State(state): State<AppState>) -> Json<ImportStatusResponse> {
    let guard = state.import_status.read();
    Json(ImportStatusResponse::from(&*guard))
}

/// Relative folders are taken from the configured media root when there is one.
fn import_folder_path(state: &AppState, value: &str) -> PathBuf {
    let raw = PathBuf::from(value.trim());
    match &state.media_root {
        Some(root) if raw.is_relative() => root.join(raw),
        _ => raw,
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}
