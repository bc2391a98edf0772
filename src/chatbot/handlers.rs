// HTTP handlers for the chatbot endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::chatbot::completion::ChatTurn;
use crate::chatbot::error::ChatError;

/// Request DTO for POST /api/chat
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Caller identity, either a plain number or "user-<n>"
    pub user_id: Option<String>,
    /// Optional prior turns, prepended verbatim
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Response DTO for POST /api/chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Normalize a caller-supplied user id ("user-123" or "123") to a number,
/// defaulting to 1 when missing or unparseable
pub fn normalize_user_id(user_id: Option<&str>) -> i32 {
    user_id
        .map(|raw| raw.strip_prefix("user-").unwrap_or(raw))
        .and_then(|raw| raw.parse::<i32>().ok())
        .unwrap_or(1)
}

/// Handler for POST /api/chat
/// Answers one message; both turns are persisted for support review
pub async fn chat_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ChatError::ValidationError("Message is required".to_string()));
    }

    let user_id = normalize_user_id(request.user_id.as_deref());

    sqlx::query(
        "INSERT INTO chat_messages (sender_type, user_id, message_text) VALUES ('user', $1, $2)",
    )
    .bind(user_id)
    .bind(message)
    .execute(&state.db)
    .await?;

    let response = state.responder.respond(message, &request.history).await;

    sqlx::query(
        "INSERT INTO chat_messages (sender_type, user_id, message_text, response_text) \
         VALUES ('bot', $1, '', $2)",
    )
    .bind(user_id)
    .bind(&response)
    .execute(&state.db)
    .await?;

    Ok(Json(ChatResponse { response }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_user_id_plain_number() {
        assert_eq!(normalize_user_id(Some("42")), 42);
    }

    #[test]
    fn test_normalize_user_id_prefixed() {
        assert_eq!(normalize_user_id(Some("user-123")), 123);
    }

    #[test]
    fn test_normalize_user_id_garbage_defaults() {
        assert_eq!(normalize_user_id(Some("anonymous")), 1);
        assert_eq!(normalize_user_id(None), 1);
    }
}
