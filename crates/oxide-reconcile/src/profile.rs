//! Saved connection profiles.
//!
//! Profiles live in a single JSON file, by default
//! `<config dir>/oxide-reconcile/config.json`:
//!
//! ```json
//! {"db_connections": {"local": {"name": "local", "dialect": "mysql", ...}}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialect::Engine;
use crate::error::{ReconcileError, Result};

/// Everything needed to open one database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Profile name.
    pub name: String,
    /// Database engine.
    #[serde(rename = "dialect")]
    pub engine: Engine,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Database to compare.
    pub database: String,
}

impl ConnectionProfile {
    /// Copy of the profile safe to print.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            password: "*".repeat(self.password.len().min(8)),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) {}@{}:{}/{}",
            self.name, self.engine, self.user, self.host, self.port, self.database
        )
    }
}

/// On-disk shape of the profile file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profiles by name.
    #[serde(default)]
    pub db_connections: BTreeMap<String, ConnectionProfile>,
}

/// JSON file holding the saved profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform's default location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `<config dir>/oxide-reconcile/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ReconcileError::ConfigDirUnavailable)?;
        Ok(dir.join("oxide-reconcile").join("config.json"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. A missing file is an empty store.
    pub fn load(&self) -> Result<ProfileConfig> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No profile file, starting empty");
            return Ok(ProfileConfig::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the file, creating its directory if needed.
    pub fn save(&self, config: &ProfileConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Saves a new profile.
    pub fn add(&self, profile: ConnectionProfile) -> Result<()> {
        let mut config = self.load()?;
        if config.db_connections.contains_key(&profile.name) {
            return Err(ReconcileError::ProfileExists(profile.name));
        }
        config.db_connections.insert(profile.name.clone(), profile);
        self.save(&config)
    }

    /// Deletes a profile.
    pub fn remove(&self, name: &str) -> Result<ConnectionProfile> {
        let mut config = self.load()?;
        let removed = config
            .db_connections
            .remove(name)
            .ok_or_else(|| ReconcileError::ProfileNotFound(name.to_string()))?;
        self.save(&config)?;
        Ok(removed)
    }

    /// Looks up a profile.
    pub fn get(&self, name: &str) -> Result<ConnectionProfile> {
        self.load()?
            .db_connections
            .remove(name)
            .ok_or_else(|| ReconcileError::ProfileNotFound(name.to_string()))
    }

    /// Every profile, sorted by name, with passwords masked.
    pub fn list(&self) -> Result<Vec<ConnectionProfile>> {
        Ok(self
            .load()?
            .db_connections
            .values()
            .map(ConnectionProfile::masked)
            .collect())
    }
}
