use axum::extract::{rejection::JsonRejection, Json, State};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::Message;

use super::payload::{read_payload, CreateMessageRequest};

/// GET /messages - list every message
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<Message>> {
    let messages = state.messages.list_all().await?;
    Ok(ApiResponse::success(messages))
}

/// POST /messages - create a message from `{body, username}`
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<Message> {
    let new_message = read_payload(payload)?.validate()?;
    let message = state.messages.create(&new_message).await?;
    Ok(ApiResponse::created(message))
}
