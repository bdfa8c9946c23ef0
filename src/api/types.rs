//! API request and response types.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::CogbotError;
use crate::render::{Page, RenderedMessage};
use crate::session::{ChannelId, GuildId, Interaction, SessionId, SessionInfo, UserId};

/// Fields shared by every command invocation from the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub user_id: UserId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    /// Absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
}

/// Open a paginator over pages a cog already fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginateRequest {
    #[serde(flatten)]
    pub invocation: Invocation,
    /// Cog the pages come from; checked against the guild's toggles.
    #[serde(default)]
    pub feature: Option<String>,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelpRequest {
    #[serde(flatten)]
    pub invocation: Invocation,
    /// Only show cogs in this category.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicTacToeRequest {
    #[serde(flatten)]
    pub invocation: Invocation,
    /// Leave out to play against the bot.
    #[serde(default)]
    pub opponent_id: Option<UserId>,
}

/// Start a single-player game or a conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    #[serde(flatten)]
    pub invocation: Invocation,
}

/// A component interaction as structured JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub interaction: Interaction,
}

/// A raw component press: the `custom_id` the session rendered plus any
/// modal value submitted with it.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentRequest {
    pub user_id: UserId,
    pub custom_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    pub user_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationQuery {
    pub user_id: u64,
    pub channel_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessageRequest {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureToggleRequest {
    pub enabled: bool,
}

/// Response for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSessionResponse {
    pub session_id: String,
    pub message: RenderedMessage,
}

impl CreatedSessionResponse {
    pub fn new(id: SessionId, message: RenderedMessage) -> Self {
        Self {
            session_id: id.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    #[serde(flatten)]
    pub session: SessionInfo,
    pub message: RenderedMessage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSessionsResponse {
    pub count: usize,
    pub sessions: Vec<SessionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "SESSION_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn session_not_found(id: &str) -> Self {
        Self::new("SESSION_NOT_FOUND", format!("Session '{}' not found", id))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn cooldown(notice: impl Into<String>, retry_after: Duration) -> Self {
        Self::new("COOLDOWN", notice).with_details(format!(
            "retry after {}s",
            retry_after.as_secs().max(1)
        ))
    }

    /// Status code and body for a crate error.
    pub fn from_error(err: &CogbotError) -> (StatusCode, Self) {
        let (status, code) = match err {
            CogbotError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            CogbotError::ConversationNotFound(_) => {
                (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND")
            }
            CogbotError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            CogbotError::FeatureDisabled(_) => (StatusCode::FORBIDDEN, "FEATURE_DISABLED"),
            CogbotError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        (status, Self::new(code, err.to_string()))
    }
}

/// WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Client presses a component.
    Interact {
        user_id: UserId,
        #[serde(flatten)]
        interaction: Interaction,
    },
    /// Server pushes the session's current message.
    Render { message: RenderedMessage },
    /// Server answers an interaction with an ephemeral notice.
    Notice { code: String, notice: String },
    /// The session ended; no further renders follow.
    Closed,
    Error { code: String, message: String },
    Ping,
    Pong,
}
