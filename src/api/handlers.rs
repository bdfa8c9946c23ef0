//! REST API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{debug, error};

use super::router::SecurityConfig;
use super::types::{
    ComponentRequest, ConversationMessageRequest, ConversationQuery, CreatedSessionResponse,
    ErrorResponse, FeatureToggleRequest, HelpRequest, InteractRequest, Invocation,
    ListSessionsResponse, PaginateRequest, PromptResponse, SessionStatusResponse, StartRequest,
    TicTacToeRequest, UserQuery,
};
use crate::cogs;
use crate::conversation::{ConversationKey, ConversationManager, ConversationReply, EmbedWizard};
use crate::error::CogbotError;
use crate::games::{MemoryGame, PasswordGame, Player, TicTacToe};
use crate::security::{CooldownTracker, Permissions, RelayKeyStore};
use crate::session::{
    ChannelId, GuildId, Interaction, Notice, Paginator, Reply, SessionId, SessionStore,
    SessionTimings, UserId, View,
};
use crate::settings::{
    AutoDeleteRule, GuildSettings, MemoryBackend, ReactionRole, SettingsBackend, SettingsStore,
};

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

/// Longest idle timeout a caller may ask for.
const MAX_TIMEOUT_SECS: u64 = 900;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub conversations: Arc<ConversationManager>,
    pub settings: Arc<SettingsStore>,
    pub cooldowns: Arc<CooldownTracker>,
    pub auth: Arc<RelayKeyStore>,
}

impl AppState {
    /// Development state: in-memory settings, no relay auth, default cooldowns.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(SessionStore::default()),
            conversations: Arc::new(ConversationManager::default()),
            settings: Arc::new(SettingsStore::new(Arc::new(MemoryBackend::new()))),
            cooldowns: Arc::new(CooldownTracker::default()),
            auth: Arc::new(RelayKeyStore::disabled()),
        }
    }

    /// Assemble state from loaded configuration.
    pub fn from_parts(
        security: &SecurityConfig,
        timings: SessionTimings,
        step_timeout: Duration,
        backend: Arc<dyn SettingsBackend>,
    ) -> Self {
        let auth = RelayKeyStore::new(security.auth.clone());
        for key in &security.relay_keys {
            auth.add_key(key.clone());
        }
        Self {
            sessions: Arc::new(SessionStore::new(timings)),
            conversations: Arc::new(ConversationManager::new(step_timeout)),
            settings: Arc::new(SettingsStore::new(backend)),
            cooldowns: Arc::new(CooldownTracker::new(security.cooldown.clone())),
            auth: Arc::new(auth),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a crate error onto an HTTP error response.
pub fn api_error(err: CogbotError) -> ApiError {
    let (status, body) = ErrorResponse::from_error(&err);
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    (status, Json(body))
}

fn parse_session_id(raw: &str) -> ApiResult<SessionId> {
    raw.parse().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::session_not_found(raw)),
        )
    })
}

/// Gate a command on the guild's feature toggle and the user's cooldown.
fn admit(state: &AppState, invocation: &Invocation, feature: &str) -> ApiResult<()> {
    if let Some(guild) = invocation.guild_id {
        if !state.settings.is_enabled(guild, feature).map_err(api_error)? {
            return Err(api_error(CogbotError::FeatureDisabled(feature.to_string())));
        }
    }

    if let Err(retry_after) = state.cooldowns.check(invocation.user_id, feature) {
        let secs = retry_after.as_secs().max(1);
        debug!(user = %invocation.user_id, feature, secs, "Command on cooldown");
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::cooldown(
                Notice::Cooldown(secs).to_string(),
                retry_after,
            )),
        ));
    }
    Ok(())
}

fn idle_override(timeout_secs: Option<u64>) -> ApiResult<Option<Duration>> {
    match timeout_secs {
        None => Ok(None),
        Some(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => {
            Ok(Some(Duration::from_secs(secs)))
        }
        Some(secs) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!(
                "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {secs}"
            ))),
        )),
    }
}

fn open(
    state: &AppState,
    invocation: &Invocation,
    view: View,
    idle: Option<Duration>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    let opened = state
        .sessions
        .open(invocation.user_id, invocation.channel_id, view, idle)
        .map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedSessionResponse::new(opened.id, opened.message)),
    ))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "cogbot",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "sessions": state.sessions.count(),
        "conversations": state.conversations.count(),
        "cooldowns": state.cooldowns.stats(),
    }))
}

pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<ListSessionsResponse>> {
    let sessions = state.sessions.list().await.map_err(api_error)?;
    Ok(Json(ListSessionsResponse {
        count: sessions.len(),
        sessions,
    }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionStatusResponse>> {
    let id = parse_session_id(&session_id)?;
    let (session, message) = state.sessions.describe(&id).await.map_err(api_error)?;
    Ok(Json(SessionStatusResponse { session, message }))
}

/// Close a session on behalf of a user.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Reply>> {
    let id = parse_session_id(&session_id)?;
    let reply = state
        .sessions
        .close(&id, UserId(query.user_id))
        .await
        .map_err(api_error)?;
    Ok(Json(reply))
}

pub async fn interact(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<InteractRequest>,
) -> ApiResult<Json<Reply>> {
    let id = parse_session_id(&session_id)?;
    let reply = state
        .sessions
        .interact(&id, req.user_id, &req.interaction)
        .await
        .map_err(api_error)?;
    Ok(Json(reply))
}

/// Route a raw component press by the session prefix of its `custom_id`.
pub async fn component(
    State(state): State<AppState>,
    Json(req): Json<ComponentRequest>,
) -> ApiResult<Json<Reply>> {
    let (id, interaction) = Interaction::parse_component(&req.custom_id, req.value.as_deref())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(format!(
                    "unrecognised component: {}",
                    req.custom_id
                ))),
            )
        })?;
    let reply = state
        .sessions
        .interact(&id, req.user_id, &interaction)
        .await
        .map_err(api_error)?;
    Ok(Json(reply))
}

pub async fn paginate(
    State(state): State<AppState>,
    Json(req): Json<PaginateRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    let feature = req.feature.as_deref().unwrap_or("paginate");
    if let Some(name) = &req.feature {
        cogs::find(name).ok_or_else(|| {
            api_error(CogbotError::InvalidInput(format!("unknown feature: {name}")))
        })?;
    }
    admit(&state, &req.invocation, feature)?;
    let idle = idle_override(req.timeout_secs)?;

    let paginator = Paginator::new(req.pages).map_err(api_error)?;
    open(&state, &req.invocation, View::Pages(paginator), idle)
}

pub async fn help(
    State(state): State<AppState>,
    Json(req): Json<HelpRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    admit(&state, &req.invocation, "help")?;

    let settings = match req.invocation.guild_id {
        Some(guild) => state.settings.get(guild).map_err(api_error)?,
        None => GuildSettings::default(),
    };
    let pages = cogs::help_pages(|cog| {
        settings.is_enabled(cog.name)
            && req
                .category
                .as_deref()
                .map_or(true, |c| cog.category.eq_ignore_ascii_case(c))
    });
    let paginator = Paginator::new(pages).map_err(|_| {
        api_error(CogbotError::InvalidInput(
            "no enabled cogs match that category".into(),
        ))
    })?;
    open(&state, &req.invocation, View::Help(paginator), None)
}

pub async fn start_tictactoe(
    State(state): State<AppState>,
    Json(req): Json<TicTacToeRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    admit(&state, &req.invocation, "tictactoe")?;
    let opponent = req.opponent_id.map_or(Player::Ai, Player::User);
    let game = TicTacToe::new(req.invocation.user_id, opponent).map_err(api_error)?;
    open(&state, &req.invocation, View::TicTacToe(game), None)
}

pub async fn start_memory(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    admit(&state, &req.invocation, "memory")?;
    let game = MemoryGame::new(req.invocation.user_id, &mut rand::thread_rng());
    open(&state, &req.invocation, View::Memory(game), None)
}

pub async fn start_password(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSessionResponse>)> {
    admit(&state, &req.invocation, "password")?;
    let game = PasswordGame::new(req.invocation.user_id, &mut rand::thread_rng());
    open(&state, &req.invocation, View::Password(game), None)
}

pub async fn start_embed_wizard(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<PromptResponse>)> {
    let channel = req.invocation.channel_id.ok_or_else(|| {
        api_error(CogbotError::InvalidInput(
            "the embed builder needs a channel".into(),
        ))
    })?;
    admit(&state, &req.invocation, "embed")?;

    let key = ConversationKey::new(req.invocation.user_id, channel);
    let prompt = state
        .conversations
        .begin(key, Box::new(EmbedWizard::new()))
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(PromptResponse { prompt })))
}

/// Deliver a chat message to the conversation waiting on its author.
pub async fn conversation_message(
    State(state): State<AppState>,
    Json(req): Json<ConversationMessageRequest>,
) -> ApiResult<Json<ConversationReply>> {
    let key = ConversationKey::new(req.user_id, req.channel_id);
    state
        .conversations
        .deliver(key, &req.content)
        .map_err(api_error)?
        .map(Json)
        .ok_or_else(|| api_error(CogbotError::ConversationNotFound(key.to_string())))
}

pub async fn cancel_conversation(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<StatusCode> {
    let key = ConversationKey::new(UserId(query.user_id), ChannelId(query.channel_id));
    if state.conversations.cancel(key).map_err(api_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(CogbotError::ConversationNotFound(key.to_string())))
    }
}

pub async fn get_settings(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
) -> ApiResult<Json<GuildSettings>> {
    let settings = state.settings.get(GuildId(guild_id)).map_err(api_error)?;
    Ok(Json(settings))
}

pub async fn set_feature(
    State(state): State<AppState>,
    Path((guild_id, feature)): Path<(u64, String)>,
    headers: HeaderMap,
    Json(req): Json<FeatureToggleRequest>,
) -> ApiResult<Json<GuildSettings>> {
    Permissions::require_manage_guild(&headers).map_err(api_error)?;
    let settings = state
        .settings
        .set_feature(GuildId(guild_id), &feature, req.enabled)
        .map_err(api_error)?;
    Ok(Json(settings))
}

pub async fn set_auto_delete(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
    headers: HeaderMap,
    Json(rule): Json<AutoDeleteRule>,
) -> ApiResult<Json<GuildSettings>> {
    Permissions::require_manage_guild(&headers).map_err(api_error)?;
    let settings = state
        .settings
        .set_auto_delete(GuildId(guild_id), rule)
        .map_err(api_error)?;
    Ok(Json(settings))
}

pub async fn add_reaction_role(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
    headers: HeaderMap,
    Json(binding): Json<ReactionRole>,
) -> ApiResult<Json<GuildSettings>> {
    Permissions::require_manage_guild(&headers).map_err(api_error)?;
    let settings = state
        .settings
        .add_reaction_role(GuildId(guild_id), binding)
        .map_err(api_error)?;
    Ok(Json(settings))
}
