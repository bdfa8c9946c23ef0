//! Persistence backends for guild settings.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::GuildSettings;
use crate::error::CogbotError;
use crate::session::GuildId;
use crate::Result;

/// Where guild settings live between restarts.
///
/// Implementations are plain blocking stores; [`super::SettingsStore`] keeps
/// the in-memory copy and decides when to call them.
pub trait SettingsBackend: Send + Sync {
    /// Load one guild's settings. `None` when nothing was ever saved.
    fn load(&self, guild: GuildId) -> Result<Option<GuildSettings>>;

    fn save(&self, guild: GuildId, settings: &GuildSettings) -> Result<()>;
}

/// One pretty-printed `<guild_id>.json` file per guild.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, guild: GuildId) -> PathBuf {
        self.dir.join(format!("{guild}.json"))
    }
}

impl SettingsBackend for JsonFileBackend {
    fn load(&self, guild: GuildId) -> Result<Option<GuildSettings>> {
        let content = match fs::read_to_string(self.path(guild)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, guild: GuildId, settings: &GuildSettings) -> Result<()> {
        let path = self.path(guild);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(settings)?;

        // Write then rename so a crash never leaves a truncated file behind.
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(%guild, path = %path.display(), "Guild settings saved");
        Ok(())
    }
}

/// In-process backend for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    guilds: Mutex<HashMap<GuildId, GuildSettings>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsBackend for MemoryBackend {
    fn load(&self, guild: GuildId) -> Result<Option<GuildSettings>> {
        let guilds = self.guilds.lock().map_err(|_| CogbotError::LockPoisoned)?;
        Ok(guilds.get(&guild).cloned())
    }

    fn save(&self, guild: GuildId, settings: &GuildSettings) -> Result<()> {
        let mut guilds = self.guilds.lock().map_err(|_| CogbotError::LockPoisoned)?;
        guilds.insert(guild, settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_backend_roundtrip() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("guilds")).unwrap();
        let guild = GuildId(42);

        assert!(backend.load(guild).unwrap().is_none());

        let mut settings = GuildSettings::default();
        settings.set_feature("nsfw", false);
        backend.save(guild, &settings).unwrap();

        assert!(dir.path().join("guilds").join("42.json").exists());
        assert!(!dir.path().join("guilds").join("42.json.tmp").exists());
        assert_eq!(backend.load(guild).unwrap(), Some(settings));
    }

    #[test]
    fn test_json_backend_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path()).unwrap();
        fs::write(dir.path().join("7.json"), "{ not json").unwrap();

        let result = backend.load(GuildId(7));
        assert!(matches!(result, Err(CogbotError::Serialization(_))));
    }
}
