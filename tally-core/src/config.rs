//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { ... },
//!   "remote": { "url": "https://xyz.supabase.co", "apiKey": "..." },
//!   "session": { "userId": "...", "accessToken": "...", "email": "..." }
//! }
//! ```
//! Fields this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::Identity;

pub const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote: Option<RemoteSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<Identity>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Connection settings for the remote mirror
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

impl RemoteSettings {
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Tally configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub remote: Option<RemoteSettings>,
    pub session: Option<Identity>,
}

impl Config {
    /// Load config from the data directory
    ///
    /// The remote endpoint can be overridden with `TALLY_REMOTE_URL` and
    /// `TALLY_REMOTE_KEY`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let mut config = Self {
            remote: raw.remote,
            session: raw.session,
        };
        config.apply_overrides(
            std::env::var("TALLY_REMOTE_URL").ok(),
            std::env::var("TALLY_REMOTE_KEY").ok(),
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, url: Option<String>, api_key: Option<String>) {
        if url.is_none() && api_key.is_none() {
            return;
        }
        let remote = self.remote.get_or_insert_with(RemoteSettings::default);
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            remote.url = url;
        }
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            remote.api_key = key;
        }
    }

    /// Save config to the data directory, preserving unmanaged settings
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;
        settings.remote = self.remote.clone();
        settings.session = self.session.clone();

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Remote settings, only when both URL and key are set
    pub fn remote_endpoint(&self) -> Option<&RemoteSettings> {
        self.remote.as_ref().filter(|r| r.is_complete())
    }

    /// True when the ledger should open in mirrored mode
    pub fn is_mirrored(&self) -> bool {
        self.session.is_some() && self.remote_endpoint().is_some()
    }

    pub fn set_session(&mut self, identity: Identity) {
        self.session = Some(identity);
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    // A damaged settings file falls back to defaults rather than locking
    // the user out
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
