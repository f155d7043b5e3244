//! Settings read from the environment (and `.env`).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use portal_cache::CacheConfig;
use portal_core::constants::DEFAULT_CACHE_TTL_SECS;
use portal_core::error::{PortalError, Result};
use portal_core::types::Actor;

pub const DATA_DIR: &str = "PORTAL_DATA_DIR";
pub const DOCUMENT_FILES_PATH: &str = "PORTAL_DOCUMENT_FILES_PATH";
pub const BULLETIN_FILES_PATH: &str = "PORTAL_BULLETIN_FILES_PATH";
pub const AUDIT_LOG: &str = "PORTAL_AUDIT_LOG";
pub const USER: &str = "PORTAL_USER";
pub const DIVISION: &str = "PORTAL_DIVISION";
pub const DEPARTMENT: &str = "PORTAL_DEPARTMENT";
pub const CACHE_TTL_SECS: &str = "PORTAL_CACHE_TTL_SECS";
#[cfg(feature = "turso")]
pub const TURSO_URL: &str = "PORTAL_TURSO_URL";
#[cfg(feature = "turso")]
pub const TURSO_AUTH_TOKEN: &str = "PORTAL_TURSO_AUTH_TOKEN";

const DEFAULT_DATA_DIR: &str = "portal-data";

/// Named `PORTAL_*` settings.
///
/// Nothing is checked up front; a missing required setting surfaces as a
/// configuration error from the command that needs it.
#[derive(Clone, Debug, Default)]
pub struct PortalSettings {
    values: BTreeMap<String, String>,
}

impl PortalSettings {
    /// Loads `.env` if present, then collects every `PORTAL_*` variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_pairs(std::env::vars().filter(|(k, _)| k.starts_with("PORTAL_")))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v): &(String, String)| !v.trim().is_empty())
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the setting or a configuration error naming it.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| PortalError::ConfigError(format!("{name} is not set")))
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.get(DATA_DIR).unwrap_or(DEFAULT_DATA_DIR))
    }

    pub fn document_files(&self) -> Result<PathBuf> {
        self.require(DOCUMENT_FILES_PATH).map(PathBuf::from)
    }

    pub fn bulletin_files(&self) -> Result<PathBuf> {
        self.require(BULLETIN_FILES_PATH).map(PathBuf::from)
    }

    /// Audit log file; defaults to `audit.jsonl` in the data directory.
    pub fn audit_log(&self) -> PathBuf {
        self.get(AUDIT_LOG)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir().join("audit.jsonl"))
    }

    /// The user every mutation is attributed to.
    pub fn actor(&self) -> Result<Actor> {
        Ok(Actor::new(
            self.require(USER)?,
            self.require(DIVISION)?,
            self.require(DEPARTMENT)?,
        ))
    }

    pub fn cache_config(&self) -> Result<CacheConfig> {
        let ttl = match self.get(CACHE_TTL_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                PortalError::ConfigError(format!("{CACHE_TTL_SECS} must be a number of seconds, got {raw:?}"))
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };
        Ok(CacheConfig::default().with_ttl(Duration::from_secs(ttl)))
    }
}
