use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Json, Path, State,
};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::Message;
use crate::error::ApiError;

use super::payload::{read_payload, UpdateMessageRequest};

/// Non-integer ids cannot name a message, so they are reported as missing
fn message_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::message_not_found())
}

/// GET /messages/:id - show a single message
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Message> {
    let id = message_id(path)?;
    let message = state.messages.get_by_id(id).await?;
    Ok(ApiResponse::success(message))
}

/// PATCH /messages/:id - replace the body of a message
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> ApiResult<Message> {
    let id = message_id(path)?;

    // Unknown ids are a 404 even when the payload is also invalid
    state.messages.get_by_id(id).await?;

    let changes = read_payload(payload)?.validate()?;
    let message = state.messages.update(id, &changes).await?;
    Ok(ApiResponse::success(message))
}

/// DELETE /messages/:id - remove a message
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let id = message_id(path)?;
    state.messages.delete(id).await?;
    Ok(ApiResponse::no_content())
}
