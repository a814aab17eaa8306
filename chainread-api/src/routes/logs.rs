//! Log endpoints: current head and reconstructed history.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chainread_core::{EventId, LogId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{DataResponse, EventListResponse, EventResponse, HistoryQuery, LogHeadResponse};

fn parse_log_id(raw: &str) -> ApiResult<LogId> {
    LogId::parse(raw).map_err(|_| ApiError::invalid_log_id(raw))
}

/// Parse the `after` cursor. Absent or empty means the start of the log.
fn parse_after(raw: Option<&str>) -> ApiResult<EventId> {
    match raw {
        None | Some("") => Ok(EventId::SENTINEL),
        Some(text) => EventId::parse(text).map_err(|_| ApiError::invalid_event_id(text)),
    }
}

/// GET /logs/{log_id}
pub async fn get_log_head(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> ApiResult<Json<DataResponse<LogHeadResponse>>> {
    let log_id = parse_log_id(&log_id)?;
    let head = state.heads.head_or_sentinel(&log_id).await?;
    Ok(Json(DataResponse::new(LogHeadResponse { log_id, head })))
}

/// GET /logs/{log_id}/events?after={event_id}
pub async fn get_log_events(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<DataResponse<EventListResponse>>> {
    let log_id = parse_log_id(&log_id)?;
    let after = parse_after(query.after.as_deref())?;

    let head = state.heads.head_or_sentinel(&log_id).await?;
    let events = state.reader.history(head, after).await?;
    tracing::debug!(%log_id, count = events.len(), "Served log history");

    Ok(Json(DataResponse::new(EventListResponse {
        events: events.iter().map(EventResponse::from).collect(),
    })))
}
