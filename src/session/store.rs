//! Live session storage and lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::{
    ChannelId, Followup, IdleTimer, Interaction, Notice, Reply, SessionId, SessionState, Step,
    UserId, View, ViewKind,
};
use crate::error::CogbotError;
use crate::render::RenderedMessage;
use crate::Result;

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Idle timeouts per view kind plus the memory grid's reveal delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimings {
    pub pages_idle: Duration,
    pub help_idle: Duration,
    pub tictactoe_idle: Duration,
    pub memory_idle: Duration,
    pub password_idle: Duration,
    pub memory_reveal: Duration,
    pub memory_mismatch: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            pages_idle: Duration::from_secs(180),
            help_idle: Duration::from_secs(120),
            tictactoe_idle: Duration::from_secs(60),
            memory_idle: Duration::from_secs(120),
            password_idle: Duration::from_secs(300),
            memory_reveal: Duration::from_secs(5),
            memory_mismatch: Duration::from_secs(1),
        }
    }
}

impl SessionTimings {
    pub fn idle_for(&self, kind: ViewKind) -> Duration {
        match kind {
            ViewKind::Pages => self.pages_idle,
            ViewKind::Help => self.help_idle,
            ViewKind::TicTacToe => self.tictactoe_idle,
            ViewKind::Memory => self.memory_idle,
            ViewKind::Password => self.password_idle,
        }
    }
}

/// One interactive message and everything needed to drive it.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub owner: UserId,
    pub channel: Option<ChannelId>,
    pub state: SessionState,
    pub view: View,
    pub created_at: Instant,
    pub last_activity: Instant,
    pub idle_timeout: Duration,
    timer: IdleTimer,
    updates: broadcast::Sender<RenderedMessage>,
}

impl Session {
    fn new(
        id: SessionId,
        owner: UserId,
        channel: Option<ChannelId>,
        view: View,
        idle_timeout: Duration,
    ) -> Self {
        let now = Instant::now();
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            id,
            owner,
            channel,
            state: SessionState::Active,
            view,
            created_at: now,
            last_activity: now,
            idle_timeout,
            timer: IdleTimer::new(),
            updates,
        }
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// The message as the relay should show it right now.
    ///
    /// Finished games keep their board with every button disabled; closed
    /// and timed-out sessions lose their controls entirely.
    pub fn render(&self) -> Result<RenderedMessage> {
        let message = self.view.render()?;
        let message = match self.state {
            SessionState::Active => message,
            SessionState::Finished => message.disable_components(),
            SessionState::Closed | SessionState::TimedOut => message.strip_components(),
        };
        Ok(message.scoped_to(self.id))
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.to_string(),
            kind: self.view.kind(),
            owner: self.owner,
            channel: self.channel,
            state: self.state,
            age_secs: self.created_at.elapsed().as_secs(),
            idle_secs: self.idle_duration().as_secs(),
            idle_timeout_secs: self.idle_timeout.as_secs(),
        }
    }

    fn publish(&self, message: &RenderedMessage) {
        // No subscribers is fine; the relay may only poll.
        let _ = self.updates.send(message.clone());
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub kind: ViewKind,
    pub owner: UserId,
    pub channel: Option<ChannelId>,
    pub state: SessionState,
    pub age_secs: u64,
    pub idle_secs: u64,
    pub idle_timeout_secs: u64,
}

/// A freshly opened session and its first message.
#[derive(Debug, Clone)]
pub struct Opened {
    pub id: SessionId,
    pub message: RenderedMessage,
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Thread-safe storage for live sessions.
///
/// Each session sits behind its own async mutex so input, idle expiry and
/// delayed follow-ups for one session apply strictly one at a time. Sessions
/// leave the map as soon as they reach a terminal state.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    timings: SessionTimings,
}

impl SessionStore {
    pub fn new(timings: SessionTimings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timings,
        }
    }

    pub fn timings(&self) -> &SessionTimings {
        &self.timings
    }

    /// Register a view and arm its idle timer.
    ///
    /// `idle_timeout` overrides the per-kind default. A view whose first
    /// message cannot be rendered is rejected as invalid input. Must be
    /// called from within a tokio runtime.
    pub fn open(
        self: &Arc<Self>,
        owner: UserId,
        channel: Option<ChannelId>,
        view: View,
        idle_timeout: Option<Duration>,
    ) -> Result<Opened> {
        let id = SessionId::new();
        let kind = view.kind();
        let idle_timeout = idle_timeout.unwrap_or_else(|| self.timings.idle_for(kind));

        let mut session = Session::new(id, owner, channel, view, idle_timeout);
        let message = session.render().map_err(|e| match e {
            CogbotError::Render(reason) => CogbotError::InvalidInput(reason),
            other => other,
        })?;
        self.arm_idle(&mut session);
        if let Some(followup) = session.view.pending_followup() {
            self.schedule_followup(id, followup);
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CogbotError::LockPoisoned)?;
        sessions.insert(id, Arc::new(Mutex::new(session)));

        info!(session = %id, ?kind, owner = %owner, "Session opened");
        Ok(Opened { id, message })
    }

    pub fn get(&self, id: &SessionId) -> Result<Option<SharedSession>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CogbotError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CogbotError::LockPoisoned)?;
        Ok(sessions.contains_key(id))
    }

    /// Get the number of live sessions.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn list_ids(&self) -> Result<Vec<SessionId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| CogbotError::LockPoisoned)?;
        Ok(sessions.keys().copied().collect())
    }

    /// Snapshot every live session.
    pub async fn list(&self) -> Result<Vec<SessionInfo>> {
        let handles: Vec<SharedSession> = {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| CogbotError::LockPoisoned)?;
            sessions.values().cloned().collect()
        };

        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            infos.push(handle.lock().await.info());
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(infos)
    }

    /// Current snapshot and rendered message of one session.
    pub async fn describe(&self, id: &SessionId) -> Result<(SessionInfo, RenderedMessage)> {
        let handle = self.require(id)?;
        let session = handle.lock().await;
        Ok((session.info(), session.render()?))
    }

    /// Subscribe to re-renders. The current message comes back alongside the
    /// receiver so nothing published in between is missed.
    pub async fn subscribe(
        &self,
        id: &SessionId,
    ) -> Result<(RenderedMessage, broadcast::Receiver<RenderedMessage>)> {
        let handle = self.require(id)?;
        let session = handle.lock().await;
        let receiver = session.updates.subscribe();
        Ok((session.render()?, receiver))
    }

    /// Feed one interaction from `user` to a session.
    ///
    /// Invalid input comes back as a notice and leaves the session untouched.
    /// Accepted input re-renders the message, publishes it to subscribers and
    /// restarts the idle timer. Input whose result cannot be rendered is
    /// rolled back and answered with a notice.
    pub async fn interact(
        self: &Arc<Self>,
        id: &SessionId,
        user: UserId,
        interaction: &Interaction,
    ) -> Result<Reply> {
        let handle = self.require(id)?;
        let mut session = handle.lock().await;

        if session.state.is_terminal() {
            return Ok(Reply::notice(&Notice::SessionOver));
        }
        if *interaction == Interaction::Close {
            return self.close_locked(&mut session, user);
        }

        let owner = session.owner;
        let before = session.view.clone();
        if let Step::Notice(notice) = session.view.apply(owner, user, interaction) {
            debug!(session = %id, user = %user, code = notice.code(), "Interaction rejected");
            return Ok(Reply::notice(&notice));
        }
        if let Err(e) = session.view.render() {
            warn!(session = %id, error = %e, "Failed to render session, input rolled back");
            session.view = before;
            return Ok(Reply::notice(&Notice::RenderFailed));
        }

        session.touch();
        if session.view.is_finished() {
            session.state.transition_to(SessionState::Finished)?;
            session.timer.cancel();
            self.detach(id)?;
            info!(session = %id, "Session finished");
        } else {
            self.arm_idle(&mut session);
            if let Some(followup) = session.view.pending_followup() {
                self.schedule_followup(*id, followup);
            }
        }

        let message = session.render()?;
        session.publish(&message);
        Ok(Reply::Update { message })
    }

    /// Close a session early on behalf of `user`.
    pub async fn close(self: &Arc<Self>, id: &SessionId, user: UserId) -> Result<Reply> {
        let handle = self.require(id)?;
        let mut session = handle.lock().await;
        if session.state.is_terminal() {
            return Ok(Reply::notice(&Notice::SessionOver));
        }
        self.close_locked(&mut session, user)
    }

    fn close_locked(&self, session: &mut Session, user: UserId) -> Result<Reply> {
        if !session.view.may_close(session.owner, user) {
            return Ok(Reply::notice(&Notice::NotSessionOwner));
        }

        session.state.transition_to(SessionState::Closed)?;
        session.timer.cancel();
        self.detach(&session.id)?;
        info!(session = %session.id, user = %user, "Session closed");

        let message = session.render()?;
        session.publish(&message);
        Ok(Reply::Update { message })
    }

    fn require(&self, id: &SessionId) -> Result<SharedSession> {
        self.get(id)?
            .ok_or_else(|| CogbotError::SessionNotFound(id.to_string()))
    }

    fn detach(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| CogbotError::LockPoisoned)?;
        sessions.remove(id);
        Ok(())
    }

    fn arm_idle(self: &Arc<Self>, session: &mut Session) {
        let store: Weak<Self> = Arc::downgrade(self);
        let id = session.id;
        session
            .timer
            .restart(session.idle_timeout, move |generation| async move {
                if let Some(store) = store.upgrade() {
                    store.expire(id, generation).await;
                }
            });
    }

    async fn expire(&self, id: SessionId, generation: u64) {
        let Ok(Some(handle)) = self.get(&id) else {
            return;
        };
        let mut session = handle.lock().await;
        // Input that arrived while this expiry waited on the lock re-armed the
        // timer; the newer generation wins.
        if session.state.is_terminal() || session.timer.generation() != generation {
            return;
        }

        session.view.on_idle_timeout();
        if session.state.transition_to(SessionState::TimedOut).is_err() {
            return;
        }
        info!(session = %id, idle_secs = session.idle_timeout.as_secs(), "Session timed out");

        match session.render() {
            Ok(message) => session.publish(&message),
            Err(e) => warn!(session = %id, error = %e, "Failed to render timed out session"),
        }
        if let Err(e) = self.detach(&id) {
            warn!(session = %id, error = %e, "Failed to detach session");
        }
    }

    fn schedule_followup(self: &Arc<Self>, id: SessionId, followup: Followup) {
        let delay = followup.delay(&self.timings);
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(store) = store.upgrade() {
                store.run_followup(id, followup).await;
            }
        });
    }

    async fn run_followup(&self, id: SessionId, followup: Followup) {
        let Ok(Some(handle)) = self.get(&id) else {
            return;
        };
        let mut session = handle.lock().await;
        if session.state.is_terminal() || !session.view.run_followup(followup) {
            return;
        }
        debug!(session = %id, ?followup, "Follow-up applied");

        match session.render() {
            Ok(message) => session.publish(&message),
            Err(e) => warn!(session = %id, error = %e, "Failed to render session"),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionTimings::default())
    }
}
