//! Short-lived, multi-message conversations.
//!
//! A conversation collects plain chat messages from one user in one channel,
//! one step at a time. The [`ConversationManager`] owns at most one
//! conversation per `(user, channel)` pair, gives every step an explicit
//! deadline and drops the conversation when the deadline passes.

mod wizard;

pub use wizard::EmbedWizard;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CogbotError;
use crate::render::RenderedMessage;
use crate::session::{ChannelId, IdleTimer, UserId};
use crate::Result;

/// Default time a user has to answer each step.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

impl ConversationKey {
    pub fn new(user_id: UserId, channel_id: ChannelId) -> Self {
        Self {
            user_id,
            channel_id,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_id, self.channel_id)
    }
}

/// Outcome of feeding one message to a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationStep {
    /// Input accepted; ask the next question.
    Continue(String),
    /// Input rejected; the same question stands.
    Retry(String),
    Complete(RenderedMessage),
    Cancelled,
}

/// A step-by-step dialogue driven by chat messages.
pub trait Conversation: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The question for the current step.
    fn prompt(&self) -> String;

    fn advance(&mut self, input: &str) -> ConversationStep;
}

/// What the relay should post after a message was delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationReply {
    Prompt { prompt: String },
    Invalid { message: String },
    Complete { message: RenderedMessage },
    Cancelled,
}

struct Entry {
    serial: u64,
    conversation: Box<dyn Conversation>,
    timer: IdleTimer,
}

/// Owns every open conversation.
pub struct ConversationManager {
    entries: Mutex<HashMap<ConversationKey, Entry>>,
    step_timeout: Duration,
    serial: AtomicU64,
}

impl ConversationManager {
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            step_timeout,
            serial: AtomicU64::new(1),
        }
    }

    /// Start `conversation` for `key` and return its first prompt.
    ///
    /// A conversation already open for the same key is cancelled.
    pub fn begin(
        self: &Arc<Self>,
        key: ConversationKey,
        conversation: Box<dyn Conversation>,
    ) -> Result<String> {
        let prompt = conversation.prompt();
        let name = conversation.name();
        let mut entry = Entry {
            serial: self.serial.fetch_add(1, Ordering::Relaxed),
            conversation,
            timer: IdleTimer::new(),
        };
        self.arm(key, &mut entry);

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CogbotError::LockPoisoned)?;
        if let Some(previous) = entries.insert(key, entry) {
            info!(%key, previous = previous.conversation.name(), "Conversation superseded");
        }
        info!(%key, conversation = name, "Conversation started");
        Ok(prompt)
    }

    /// Deliver a chat message. Returns `None` when `key` has no open
    /// conversation, meaning the message is not ours to answer.
    pub fn deliver(
        self: &Arc<Self>,
        key: ConversationKey,
        input: &str,
    ) -> Result<Option<ConversationReply>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CogbotError::LockPoisoned)?;
        let Some(entry) = entries.get_mut(&key) else {
            return Ok(None);
        };

        let reply = match entry.conversation.advance(input) {
            ConversationStep::Continue(prompt) => {
                self.arm(key, entry);
                ConversationReply::Prompt { prompt }
            }
            ConversationStep::Retry(message) => {
                self.arm(key, entry);
                ConversationReply::Invalid { message }
            }
            ConversationStep::Complete(message) => {
                entries.remove(&key);
                info!(%key, "Conversation completed");
                ConversationReply::Complete { message }
            }
            ConversationStep::Cancelled => {
                entries.remove(&key);
                info!(%key, "Conversation cancelled by user");
                ConversationReply::Cancelled
            }
        };
        Ok(Some(reply))
    }

    /// Cancel the conversation for `key`. Returns whether one was open.
    pub fn cancel(&self, key: ConversationKey) -> Result<bool> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CogbotError::LockPoisoned)?;
        let removed = entries.remove(&key).is_some();
        if removed {
            info!(%key, "Conversation cancelled");
        }
        Ok(removed)
    }

    pub fn is_open(&self, key: ConversationKey) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn arm(self: &Arc<Self>, key: ConversationKey, entry: &mut Entry) {
        let manager: Weak<Self> = Arc::downgrade(self);
        let serial = entry.serial;
        entry
            .timer
            .restart(self.step_timeout, move |generation| async move {
                if let Some(manager) = manager.upgrade() {
                    manager.expire(key, serial, generation);
                }
            });
    }

    fn expire(&self, key: ConversationKey, serial: u64, generation: u64) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let current = entries
            .get(&key)
            .is_some_and(|e| e.serial == serial && e.timer.generation() == generation);
        if current {
            entries.remove(&key);
            info!(%key, "Conversation timed out");
        } else {
            debug!(%key, serial, "Stale conversation timer ignored");
        }
    }
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Asks for two numbers and completes with their sum.
    struct Adder {
        first: Option<i64>,
    }

    impl Conversation for Adder {
        fn name(&self) -> &'static str {
            "adder"
        }

        fn prompt(&self) -> String {
            match self.first {
                None => "First number?".into(),
                Some(_) => "Second number?".into(),
            }
        }

        fn advance(&mut self, input: &str) -> ConversationStep {
            if input == "cancel" {
                return ConversationStep::Cancelled;
            }
            let Ok(n) = input.trim().parse::<i64>() else {
                return ConversationStep::Retry("Not a number.".into());
            };
            match self.first {
                None => {
                    self.first = Some(n);
                    ConversationStep::Continue(self.prompt())
                }
                Some(a) => ConversationStep::Complete(
                    RenderedMessage::default().with_content((a + n).to_string()),
                ),
            }
        }
    }

    fn adder() -> Box<dyn Conversation> {
        Box::new(Adder { first: None })
    }

    const KEY: ConversationKey = ConversationKey {
        user_id: UserId(1),
        channel_id: ChannelId(100),
    };

    fn manager(timeout_secs: u64) -> Arc<ConversationManager> {
        Arc::new(ConversationManager::new(Duration::from_secs(timeout_secs)))
    }

    #[tokio::test]
    async fn test_full_conversation() {
        let manager = manager(60);
        assert_eq!(manager.begin(KEY, adder()).unwrap(), "First number?");

        let reply = manager.deliver(KEY, "x").unwrap().unwrap();
        assert_eq!(
            reply,
            ConversationReply::Invalid {
                message: "Not a number.".into()
            }
        );

        manager.deliver(KEY, "2").unwrap();
        let reply = manager.deliver(KEY, "3").unwrap().unwrap();
        let ConversationReply::Complete { message } = reply else {
            panic!("expected completion");
        };
        assert_eq!(message.content.as_deref(), Some("5"));
        assert!(!manager.is_open(KEY));
    }

    #[tokio::test]
    async fn test_messages_without_conversation_are_ignored() {
        let manager = manager(60);
        assert!(manager.deliver(KEY, "hello").unwrap().is_none());

        manager.begin(KEY, adder()).unwrap();
        let elsewhere = ConversationKey::new(UserId(1), ChannelId(101));
        assert!(manager.deliver(elsewhere, "1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_begin_replaces_previous() {
        let manager = manager(60);
        manager.begin(KEY, adder()).unwrap();
        manager.deliver(KEY, "7").unwrap();

        manager.begin(KEY, adder()).unwrap();
        assert_eq!(manager.count(), 1);
        // The replacement starts from its first step again.
        let reply = manager.deliver(KEY, "1").unwrap().unwrap();
        assert_eq!(
            reply,
            ConversationReply::Prompt {
                prompt: "Second number?".into()
            }
        );
    }

    #[tokio::test]
    async fn test_cancel() {
        let manager = manager(60);
        manager.begin(KEY, adder()).unwrap();
        assert_eq!(
            manager.deliver(KEY, "cancel").unwrap(),
            Some(ConversationReply::Cancelled)
        );
        assert!(!manager.cancel(KEY).unwrap());

        manager.begin(KEY, adder()).unwrap();
        assert!(manager.cancel(KEY).unwrap());
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_deadline() {
        let manager = manager(30);
        manager.begin(KEY, adder()).unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        manager.deliver(KEY, "1").unwrap();

        // The answer restarted the deadline.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(manager.is_open(KEY));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!manager.is_open(KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_end_replacement() {
        let manager = manager(30);
        manager.begin(KEY, adder()).unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;

        manager.begin(KEY, adder()).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(manager.is_open(KEY));
    }
}
