//! Per-guild settings: feature toggles, auto-delete rules and reaction roles.

mod backend;

pub use backend::{JsonFileBackend, MemoryBackend, SettingsBackend};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cogs;
use crate::error::CogbotError;
use crate::session::{ChannelId, GuildId, MessageId, RoleId};
use crate::Result;

/// Longest auto-delete delay accepted (one week).
pub const MAX_AUTO_DELETE_SECS: u64 = 7 * 24 * 60 * 60;

/// Delete every message in a channel some time after it was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDeleteRule {
    pub channel_id: ChannelId,
    pub after_secs: u64,
}

/// Grant `role_id` to whoever reacts with `emoji` on `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRole {
    pub message_id: MessageId,
    pub emoji: String,
    pub role_id: RoleId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Cog name to enabled flag. Missing cogs are enabled.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub auto_delete: Vec<AutoDeleteRule>,
    #[serde(default)]
    pub reaction_roles: Vec<ReactionRole>,
}

impl GuildSettings {
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.features
            .get(&feature.to_ascii_lowercase())
            .copied()
            .unwrap_or(true)
    }

    pub fn set_feature(&mut self, feature: &str, enabled: bool) {
        self.features.insert(feature.to_ascii_lowercase(), enabled);
    }

    /// Add a rule, replacing any existing rule for the same channel.
    pub fn upsert_auto_delete(&mut self, rule: AutoDeleteRule) {
        match self
            .auto_delete
            .iter_mut()
            .find(|r| r.channel_id == rule.channel_id)
        {
            Some(existing) => *existing = rule,
            None => self.auto_delete.push(rule),
        }
    }

    pub fn auto_delete_for(&self, channel: ChannelId) -> Option<&AutoDeleteRule> {
        self.auto_delete.iter().find(|r| r.channel_id == channel)
    }

    /// Bind an emoji on a message to a role. Rebinding the same emoji on the
    /// same message replaces the role.
    pub fn add_reaction_role(&mut self, binding: ReactionRole) {
        match self
            .reaction_roles
            .iter_mut()
            .find(|r| r.message_id == binding.message_id && r.emoji == binding.emoji)
        {
            Some(existing) => existing.role_id = binding.role_id,
            None => self.reaction_roles.push(binding),
        }
    }

    pub fn role_for(&self, message: MessageId, emoji: &str) -> Option<RoleId> {
        self.reaction_roles
            .iter()
            .find(|r| r.message_id == message && r.emoji == emoji)
            .map(|r| r.role_id)
    }
}

/// Cached, write-through access to guild settings.
///
/// Every mutation is persisted before the cache changes, so a failed save
/// leaves both the cache and the backend at the previous value.
pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    cache: RwLock<HashMap<GuildId, GuildSettings>>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Settings for `guild`, defaults when none were saved.
    pub fn get(&self, guild: GuildId) -> Result<GuildSettings> {
        {
            let cache = self.cache.read().map_err(|_| CogbotError::LockPoisoned)?;
            if let Some(settings) = cache.get(&guild) {
                return Ok(settings.clone());
            }
        }

        let loaded = self.backend.load(guild)?.unwrap_or_default();
        let mut cache = self.cache.write().map_err(|_| CogbotError::LockPoisoned)?;
        Ok(cache.entry(guild).or_insert(loaded).clone())
    }

    pub fn is_enabled(&self, guild: GuildId, feature: &str) -> Result<bool> {
        Ok(self.get(guild)?.is_enabled(feature))
    }

    /// Apply `change` to a copy, persist it, then publish it to the cache.
    pub fn update<F>(&self, guild: GuildId, change: F) -> Result<GuildSettings>
    where
        F: FnOnce(&mut GuildSettings),
    {
        let mut cache = self.cache.write().map_err(|_| CogbotError::LockPoisoned)?;
        let mut settings = match cache.get(&guild) {
            Some(settings) => settings.clone(),
            None => self.backend.load(guild)?.unwrap_or_default(),
        };

        change(&mut settings);
        self.backend.save(guild, &settings)?;
        cache.insert(guild, settings.clone());
        Ok(settings)
    }

    /// Toggle a cog. Unknown cog names are rejected.
    pub fn set_feature(&self, guild: GuildId, feature: &str, enabled: bool) -> Result<GuildSettings> {
        let cog = cogs::find(feature)
            .ok_or_else(|| CogbotError::InvalidInput(format!("unknown feature: {feature}")))?;
        let settings = self.update(guild, |s| s.set_feature(cog.name, enabled))?;
        info!(%guild, feature = cog.name, enabled, "Feature toggled");
        Ok(settings)
    }

    pub fn set_auto_delete(&self, guild: GuildId, rule: AutoDeleteRule) -> Result<GuildSettings> {
        if rule.after_secs == 0 || rule.after_secs > MAX_AUTO_DELETE_SECS {
            return Err(CogbotError::InvalidInput(format!(
                "auto-delete delay must be between 1 and {MAX_AUTO_DELETE_SECS} seconds"
            )));
        }
        let channel = rule.channel_id;
        let settings = self.update(guild, |s| s.upsert_auto_delete(rule))?;
        info!(%guild, %channel, "Auto-delete rule saved");
        Ok(settings)
    }

    pub fn add_reaction_role(&self, guild: GuildId, binding: ReactionRole) -> Result<GuildSettings> {
        if binding.emoji.trim().is_empty() {
            return Err(CogbotError::InvalidInput("emoji must not be empty".into()));
        }
        let message = binding.message_id;
        let settings = self.update(guild, |s| s.add_reaction_role(binding))?;
        info!(%guild, %message, "Reaction role bound");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GUILD: GuildId = GuildId(1);

    fn memory_store() -> SettingsStore {
        SettingsStore::new(Arc::new(MemoryBackend::new()))
    }

    /// Loads fine, refuses every save.
    struct ReadOnlyBackend;

    impl SettingsBackend for ReadOnlyBackend {
        fn load(&self, _: GuildId) -> Result<Option<GuildSettings>> {
            Ok(None)
        }

        fn save(&self, _: GuildId, _: &GuildSettings) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn test_features_default_enabled() {
        let store = memory_store();
        assert!(store.is_enabled(GUILD, "tictactoe").unwrap());

        store.set_feature(GUILD, "TicTacToe", false).unwrap();
        assert!(!store.is_enabled(GUILD, "tictactoe").unwrap());
        assert!(store.is_enabled(GUILD, "memory").unwrap());
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let store = memory_store();
        let result = store.set_feature(GUILD, "warp-drive", true);
        assert!(matches!(result, Err(CogbotError::InvalidInput(_))));
    }

    #[test]
    fn test_auto_delete_upsert() {
        let store = memory_store();
        let rule = |after_secs| AutoDeleteRule {
            channel_id: ChannelId(9),
            after_secs,
        };
        store.set_auto_delete(GUILD, rule(30)).unwrap();
        let settings = store.set_auto_delete(GUILD, rule(60)).unwrap();

        assert_eq!(settings.auto_delete.len(), 1);
        assert_eq!(settings.auto_delete_for(ChannelId(9)).unwrap().after_secs, 60);
        assert!(store.set_auto_delete(GUILD, rule(0)).is_err());
    }

    #[test]
    fn test_reaction_role_rebind() {
        let store = memory_store();
        let bind = |role| ReactionRole {
            message_id: MessageId(5),
            emoji: "🎮".into(),
            role_id: RoleId(role),
        };
        store.add_reaction_role(GUILD, bind(100)).unwrap();
        let settings = store.add_reaction_role(GUILD, bind(200)).unwrap();

        assert_eq!(settings.reaction_roles.len(), 1);
        assert_eq!(settings.role_for(MessageId(5), "🎮"), Some(RoleId(200)));
        assert_eq!(settings.role_for(MessageId(5), "🎲"), None);
    }

    #[test]
    fn test_failed_save_leaves_cache_untouched() {
        let store = SettingsStore::new(Arc::new(ReadOnlyBackend));
        assert!(store.set_feature(GUILD, "meme", false).is_err());
        assert!(store.is_enabled(GUILD, "meme").unwrap());
    }

    #[test]
    fn test_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let backend = Arc::new(JsonFileBackend::new(dir.path()).unwrap());
            let store = SettingsStore::new(backend);
            store.set_feature(GUILD, "nsfw", false).unwrap();
        }

        let backend = Arc::new(JsonFileBackend::new(dir.path()).unwrap());
        let store = SettingsStore::new(backend);
        assert!(!store.is_enabled(GUILD, "nsfw").unwrap());
    }
}
