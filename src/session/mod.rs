//! Interactive sessions.
//!
//! A session is one message with components (buttons) that a user drives by
//! pressing them. This module holds the identifiers, the lifecycle state
//! machine, the idle timer and the store that serializes input per session.

mod id;
mod interaction;
mod notice;
mod paginator;
mod state;
mod store;
mod timer;
mod view;

pub use id::{ChannelId, GuildId, MessageId, RoleId, SessionId, UserId};
pub use interaction::Interaction;
pub use notice::{Notice, Reply, Step};
pub use paginator::Paginator;
pub use state::SessionState;
pub use store::{Opened, Session, SessionInfo, SessionStore, SessionTimings, SharedSession};
pub use timer::IdleTimer;
pub use view::{Followup, View, ViewKind};
