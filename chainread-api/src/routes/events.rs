//! Single event lookup through the cache tiers.

use axum::{
    extract::{Path, State},
    Json,
};
use chainread_core::EventId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{DataResponse, EventResponse};

/// GET /events/{event_id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<DataResponse<EventResponse>>> {
    let id = EventId::parse(&event_id).map_err(|_| ApiError::invalid_event_id(&event_id))?;
    let event = state.reader.resolve(&id).await?;
    Ok(Json(DataResponse::new(EventResponse::from(&event))))
}
