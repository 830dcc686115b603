use axum::extract::{rejection::JsonRejection, Json};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::database::{MessageChanges, NewMessage};
use crate::error::{ApiError, MISSING_BODY, MISSING_BODY_OR_USERNAME, PAYLOAD_TOO_LARGE};

/// Body of `POST /messages`
#[derive(Debug, Default, Deserialize)]
pub struct CreateMessageRequest {
    pub body: Option<String>,
    pub username: Option<String>,
}

/// Body of `PATCH /messages/:id`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMessageRequest {
    pub body: Option<String>,
}

impl CreateMessageRequest {
    pub fn validate(self) -> Result<NewMessage, ApiError> {
        match (self.body, self.username) {
            (Some(body), Some(username)) => Ok(NewMessage { body, username }),
            _ => Err(ApiError::bad_request(MISSING_BODY_OR_USERNAME)),
        }
    }
}

impl UpdateMessageRequest {
    pub fn validate(self) -> Result<MessageChanges, ApiError> {
        self.body
            .map(|body| MessageChanges { body })
            .ok_or_else(|| ApiError::bad_request(MISSING_BODY))
    }
}

/// Oversized bodies are refused with 413. Any other unreadable body (bad JSON, wrong
/// content type, wrong field types) counts as missing fields.
pub fn read_payload<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("Rejected oversized request body: {}", rejection);
            Err(ApiError::payload_too_large(PAYLOAD_TOO_LARGE))
        }
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection);
            Ok(T::default())
        }
    }
}
