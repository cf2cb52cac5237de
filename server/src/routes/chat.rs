use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::{
    chat::{ChatError, IncomingMessage},
    errors::{ApiError, ServerResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ServerResult<Json<Value>, ApiError> {
    let Some(client) = state.chat.as_ref() else {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Assistant is not configured").into());
    };

    match client.reply(request.messages).await {
        Ok(message) => Ok(Json(json!({ "message": message }))),
        Err(ChatError::EmptyHistory) => Err(ApiError::bad_request("Messages are required").into()),
        Err(err) => {
            error!(error = ?err, "Assistant request failed");
            Err(ApiError::new(StatusCode::BAD_GATEWAY, "Assistant is unavailable").into())
        }
    }
}
