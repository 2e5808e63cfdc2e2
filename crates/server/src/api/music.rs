use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    Json,
};

use crate::state::{AppState, JsonResult, ListResponse, MusicView, PageQuery};
use crate::utils::json_error;

pub async fn list_music(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> JsonResult<ListResponse<MusicView>> {
    let page = parse_page(params.page.as_deref());
    let result = state
        .catalog
        .list_page(page, state.config.page_size)
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("catalog error: {}", err),
            )
        })?;

    let has_next = result.has_next();
    let has_previous = result.has_previous();
    Ok(Json(ListResponse {
        items: result.items.into_iter().map(MusicView::from).collect(),
        page: result.page,
        per_page: result.per_page,
        total: result.total,
        num_pages: result.num_pages,
        has_next,
        has_previous,
    }))
}

pub async fn get_music(
    State(state): State<AppState>,
    AxumPath(media_id): AxumPath<String>,
) -> JsonResult<MusicView> {
    match state.catalog.get(&media_id) {
        Ok(Some(record)) => Ok(Json(MusicView::from(record))),
        Ok(None) => Err(json_error(StatusCode::NOT_FOUND, "music not found")),
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("catalog error: {}", err),
        )),
    }
}

/// Missing or non-numeric pages mean the first page. Numeric pages outside
/// the valid range are left for the catalog to clamp.
fn parse_page(value: Option<&str>) -> usize {
    value
        .map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .map(|page| if page < 1 { 0 } else { page as usize })
        .unwrap_or(1)
}
