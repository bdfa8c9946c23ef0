//! Security module for cogbot.
//!
//! This module guards the relay-facing API.
//!
//! ## Features
//!
//! - **Relay Authentication**: Bearer key shared with the gateway relay
//! - **Command Cooldowns**: Per-user sliding window on session creation
//! - **Member Permissions**: Discord permission bitfield checks for settings
//!
//! ## Example
//!
//! ```rust
//! use cogbot::security::{CooldownTracker, Permissions, RelayKeyStore};
//! use cogbot::session::UserId;
//!
//! let auth = RelayKeyStore::default();
//! auth.add_key("relay-secret");
//! assert!(auth.is_valid("relay-secret"));
//!
//! let cooldowns = CooldownTracker::default();
//! assert!(cooldowns.check(UserId(1), "tictactoe").is_ok());
//!
//! let perms = Permissions::parse("32").unwrap();
//! assert!(perms.can_manage_guild());
//! ```

pub mod auth;
pub mod cooldown;
pub mod permissions;

pub use auth::{generate_relay_key, relay_auth_middleware, AuthConfig, RelayKeyStore};
pub use cooldown::{CooldownConfig, CooldownStats, CooldownTracker};
pub use permissions::{Permissions, PERMISSIONS_HEADER};
