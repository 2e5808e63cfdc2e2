use std::io::{self, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::content_type::ContentTypes;
use crate::range::{parse_range_header, RangeError};
use crate::resolver::MediaResolver;
use crate::utils::{content_disposition, text_response};

#[derive(Clone)]
pub struct MediaState {
    pub resolver: Arc<dyn MediaResolver>,
    pub content_types: Arc<ContentTypes>,
    pub chunk_size: usize,
}

pub fn media_router(state: MediaState) -> Router {
    Router::new()
        .route("/media/:media_id", get(serve_media))
        .with_state(state)
}

async fn serve_media(
    State(state): State<MediaState>,
    AxumPath(media_id): AxumPath<String>,
    headers: HeaderMap,
) -> Response {
    stream_media(&state, &media_id, headers.get(header::RANGE)).await
}

/// Answers one media request: 404 when the identifier does not lead to a
/// readable file, 400/416 for bad ranges, otherwise a streamed 200 or 206.
pub async fn stream_media(
    state: &MediaState,
    media_id: &str,
    range_header: Option<&HeaderValue>,
) -> Response {
    let resolver = Arc::clone(&state.resolver);
    let lookup_id = media_id.to_string();
    // Catalog reads and path probing block; keep them off the async workers.
    let path = match tokio::task::spawn_blocking(move || resolver.resolve(&lookup_id)).await {
        Ok(Some(path)) => path,
        Ok(None) => {
            debug!("Media {} not resolved", media_id);
            return text_response(StatusCode::NOT_FOUND, format!("media not found: {}", media_id));
        }
        Err(err) => {
            warn!("Resolving media {} failed: {}", media_id, err);
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "media lookup failed");
        }
    };

    let (mut file, size) = match open_source(&path).await {
        Ok(source) => source,
        Err(err) => {
            debug!("Media {} unreadable at {:?}: {}", media_id, path, err);
            return text_response(StatusCode::NOT_FOUND, format!("media not found: {}", media_id));
        }
    };

    let window = match range_header {
        None => None,
        Some(value) => {
            let value = match value.to_str() {
                Ok(value) => value,
                Err(_) => return text_response(StatusCode::BAD_REQUEST, "malformed range header"),
            };
            match parse_range_header(value, size) {
                Ok(range) => Some(range),
                Err(RangeError::Invalid) => {
                    return text_response(
                        StatusCode::BAD_REQUEST,
                        format!("malformed range header: {}", value),
                    )
                }
                Err(RangeError::Unsatisfiable) => return range_not_satisfiable(size),
            }
        }
    };

    let (start, length) = match window {
        Some(range) => (range.start, range.length()),
        None => (0, size),
    };
    if start > 0 {
        if let Err(err) = file.seek(SeekFrom::Start(start)).await {
            warn!("Seek to {} in {:?} failed: {}", start, path, err);
            return text_response(StatusCode::NOT_FOUND, format!("media not readable: {}", media_id));
        }
    }

    let content_type = state.content_types.lookup(&path);
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| media_id.to_string());
    debug!(
        "Streaming {} ({:?}) bytes {}+{} of {}",
        media_id, path, start, length, size
    );

    let body = Body::from_stream(body_stream(
        file,
        length,
        state.chunk_size,
        Arc::from(media_id),
    ));
    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename));
    builder = match window {
        Some(range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, range.content_range(size)),
        None => builder.status(StatusCode::OK),
    };
    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn open_source(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path).await?;
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }
    Ok((file, metadata.len()))
}

fn range_not_satisfiable(size: u64) -> Response {
    let content_range = HeaderValue::from_str(&format!("bytes */{}", size))
        .unwrap_or_else(|_| HeaderValue::from_static("bytes */0"));
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [
            (header::CONTENT_RANGE, content_range),
            (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
        ],
    )
        .into_response()
}

struct BodyState {
    reader: ReaderStream<Take<File>>,
    remaining: u64,
}

/// Streams exactly `length` bytes from the file's current position. A read
/// error, or the file ending early, ends the stream with an error so the
/// connection is aborted instead of sending a short body. The file is
/// dropped as soon as the stream finishes or the body is dropped.
fn body_stream(
    file: File,
    length: u64,
    chunk_size: usize,
    media_id: Arc<str>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let state = BodyState {
        reader: ReaderStream::with_capacity(file.take(length), chunk_size.max(1)),
        remaining: length,
    };
    stream::unfold(Some(state), move |state| {
        let media_id = Arc::clone(&media_id);
        async move {
            let mut state = state?;
            match state.reader.next().await {
                Some(Ok(chunk)) => {
                    state.remaining = state.remaining.saturating_sub(chunk.len() as u64);
                    Some((Ok(chunk), Some(state)))
                }
                Some(Err(err)) => {
                    warn!("Read failed while streaming {}: {}", media_id, err);
                    Some((Err(err), None))
                }
                None if state.remaining > 0 => {
                    warn!(
                        "Media {} ended {} bytes early; aborting response",
                        media_id, state.remaining
                    );
                    let err = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended {} bytes early", state.remaining),
                    );
                    Some((Err(err), None))
                }
                None => None,
            }
        }
    })
}
