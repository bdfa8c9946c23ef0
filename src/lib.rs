//! # cogbot
//!
//! Interactive session core for a cog-based Discord bot.
//!
//! A gateway relay forwards slash commands and component presses to this
//! crate over HTTP. cogbot keeps the state behind every interactive
//! message (paginators, the help browser, tic-tac-toe, a memory grid and
//! a password game), expires idle ones, runs multi-step conversations and
//! stores per-guild settings.
//!
//! ## Features
//!
//! - **Sessions**: Owner-scoped interactive messages with idle timeouts
//! - **Games**: Tic-tac-toe with a minimax bot, memory grid, password rules
//! - **Conversations**: Keyed wizards that wait for the user's next message
//! - **Guild settings**: Feature toggles, auto-delete rules, reaction roles
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cogbot::render::Page;
//! use cogbot::session::{Interaction, Paginator, SessionStore, UserId, View};
//!
//! #[tokio::main]
//! async fn main() -> cogbot::Result<()> {
//!     cogbot::logging::try_init().ok();
//!
//!     let store = Arc::new(SessionStore::default());
//!     let pages = vec![Page::titled("One"), Page::titled("Two")];
//!     let view = View::Pages(Paginator::new(pages)?);
//!
//!     let opened = store.open(UserId(1), None, view, None)?;
//!     let reply = store.interact(&opened.id, UserId(1), &Interaction::Next).await?;
//!     println!("{:?}", reply.message());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod cogs;
pub mod config;
pub mod conversation;
pub mod error;
pub mod games;
pub mod logging;
pub mod render;
pub mod security;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use error::{CogbotError, Result};
pub use render::{Page, RenderedMessage};
pub use session::{Interaction, Reply, SessionId, SessionState, SessionStore, UserId, View};
pub use settings::{GuildSettings, SettingsStore};
