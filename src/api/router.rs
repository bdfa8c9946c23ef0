//! API router configuration.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{
    add_reaction_role, api_info, cancel_conversation, close_session, component,
    conversation_message, get_session, get_settings, health, help, interact, list_sessions,
    paginate, set_auto_delete, set_feature, start_embed_wizard, start_memory, start_password,
    start_tictactoe, AppState,
};
use super::websocket::ws_handler;
use crate::error::CogbotError;
use crate::security::{relay_auth_middleware, AuthConfig, CooldownConfig};

/// Create the API router with default development state.
pub fn create_router() -> Router {
    create_router_with_state(AppState::new())
}

/// Create the API router with custom state.
pub fn create_router_with_state(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/", get(list_sessions))
        .route("/{id}", get(get_session).delete(close_session))
        .route("/{id}/interact", post(interact))
        .route("/{id}/ws", any(ws_handler));

    let game_routes = Router::new()
        .route("/tictactoe", post(start_tictactoe))
        .route("/memory", post(start_memory))
        .route("/password", post(start_password));

    let settings_routes = Router::new()
        .route("/", get(get_settings))
        .route("/features/{feature}", put(set_feature))
        .route("/autodelete", put(set_auto_delete))
        .route("/reaction-roles", put(add_reaction_role));

    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/components", post(component))
        .route("/paginate", post(paginate))
        .route("/help", post(help))
        .route("/wizards/embed", post(start_embed_wizard))
        .route("/conversations", delete(cancel_conversation))
        .route("/conversations/message", post(conversation_message))
        .nest("/sessions", session_routes)
        .nest("/games", game_routes)
        .nest("/guilds/{guild_id}/settings", settings_routes);

    let auth = Arc::clone(&state.auth);
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(auth, relay_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Relay-facing security settings.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub auth: AuthConfig,
    pub relay_keys: Vec<String>,
    pub cooldown: CooldownConfig,
}

impl SecurityConfig {
    /// Relay key required, cooldowns on.
    pub fn secure() -> Self {
        Self::default()
    }

    /// No relay key, no cooldowns.
    pub fn development() -> Self {
        Self {
            auth: AuthConfig::disabled(),
            relay_keys: Vec::new(),
            cooldown: CooldownConfig::disabled(),
        }
    }

    pub fn with_relay_key(mut self, key: impl Into<String>) -> Self {
        self.relay_keys.push(key.into());
        self
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Finish in-flight requests on Ctrl+C before exiting.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            graceful_shutdown: true,
        }
    }

    pub fn without_graceful_shutdown(mut self) -> Self {
        self.graceful_shutdown = false;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Start the API server with custom state.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router_with_state(state);

    info!("Starting cogbot API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(CogbotError::Io)?;

    let server = axum::serve(listener, router);
    let result = if config.graceful_shutdown {
        server.with_graceful_shutdown(shutdown_signal()).await
    } else {
        server.await
    };
    result.map_err(CogbotError::Io)?;

    info!("Server stopped");
    Ok(())
}
