//! API layer for cogbot.
//!
//! The gateway relay talks to cogbot over these endpoints: it forwards
//! command invocations and component presses, and posts or edits the
//! messages that come back.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//!
//! ### Sessions
//! - `GET /api/v1/sessions` - List live sessions
//! - `GET /api/v1/sessions/{id}` - Session status and current message
//! - `DELETE /api/v1/sessions/{id}?user_id=` - Close a session
//! - `POST /api/v1/sessions/{id}/interact` - Structured interaction
//! - `POST /api/v1/components` - Raw `custom_id` press
//! - `WS /api/v1/sessions/{id}/ws` - Live re-renders and interactions
//!
//! ### Commands
//! - `POST /api/v1/paginate`, `POST /api/v1/help`
//! - `POST /api/v1/games/{tictactoe,memory,password}`
//! - `POST /api/v1/wizards/embed`
//! - `POST /api/v1/conversations/message`, `DELETE /api/v1/conversations`
//!
//! ### Guild settings
//! - `GET /api/v1/guilds/{guild_id}/settings`
//! - `PUT .../features/{feature}`, `PUT .../autodelete`, `PUT .../reaction-roles`
//!
//! ## Example
//!
//! ```no_run
//! use cogbot::api::{serve, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> cogbot::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config, AppState::new()).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;
pub mod websocket;

// Re-export commonly used types
pub use handlers::{api_error, ApiError, ApiResult, AppState};
pub use router::{create_router, create_router_with_state, serve, SecurityConfig, ServerConfig};
pub use types::{
    CreatedSessionResponse, ErrorResponse, InteractRequest, ListSessionsResponse,
    SessionStatusResponse, WsMessage,
};
