//! Cache scopes and validated scope keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_SCOPE_KEY_LEN;
use crate::error::{PortalError, Result};

/// A keyed-scope key that passed the allow-list check.
///
/// The only way to build one is [`ScopeKey::parse`], so anything holding a
/// `ScopeKey` may splice it into a table name or file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Validates `raw` against `[A-Za-z0-9_]+`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(PortalError::ValidationError("scope key cannot be empty".into()));
        }
        if raw.len() > MAX_SCOPE_KEY_LEN {
            return Err(PortalError::ValidationError(format!(
                "scope key longer than {} characters",
                MAX_SCOPE_KEY_LEN
            )));
        }
        if let Some(bad) = raw.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(PortalError::ValidationError(format!(
                "scope key contains disallowed character {:?}",
                bad
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ScopeKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ScopeKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Scope a cached value belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// The single collection of a list-oriented service.
    Singleton,
    /// One dataset out of many served by the same service.
    Keyed(ScopeKey),
}

impl CacheScope {
    /// Returns the key of a keyed scope.
    pub fn key(&self) -> Option<&ScopeKey> {
        match self {
            CacheScope::Singleton => None,
            CacheScope::Keyed(key) => Some(key),
        }
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Singleton => f.write_str("singleton"),
            CacheScope::Keyed(key) => write!(f, "keyed:{}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("CAP" ; "uppercase")]
    #[test_case("mlcc_0402" ; "lowercase with digits")]
    #[test_case("_" ; "single underscore")]
    fn test_accepts_allowed_keys(raw: &str) {
        let key = ScopeKey::parse(raw).unwrap();
        assert_eq!(key.as_str(), raw);
    }

    #[test_case("" ; "empty")]
    #[test_case("a/b" ; "path separator")]
    #[test_case("..\\x" ; "backslash")]
    #[test_case("x'--" ; "quote")]
    #[test_case("cap list" ; "space")]
    #[test_case("電容" ; "non ascii")]
    fn test_rejects_disallowed_keys(raw: &str) {
        let err = ScopeKey::parse(raw).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_rejects_overlong_key() {
        let raw = "a".repeat(MAX_SCOPE_KEY_LEN + 1);
        assert!(ScopeKey::parse(&raw).is_err());
        assert!(ScopeKey::parse(&raw[1..]).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ScopeKey = serde_json::from_str("\"RES_0603\"").unwrap();
        assert_eq!(ok.as_str(), "RES_0603");
        assert!(serde_json::from_str::<ScopeKey>("\"../etc\"").is_err());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(CacheScope::Singleton.to_string(), "singleton");
        let keyed = CacheScope::Keyed(ScopeKey::parse("IND").unwrap());
        assert_eq!(keyed.to_string(), "keyed:IND");
        assert_eq!(keyed.key().map(ScopeKey::as_str), Some("IND"));
        assert!(CacheScope::Singleton.key().is_none());
    }

    proptest! {
        #[test]
        fn prop_parsed_keys_only_hold_allowed_chars(raw in ".{0,40}") {
            if let Ok(key) = ScopeKey::parse(&raw) {
                prop_assert!(key.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                prop_assert!(!key.as_str().is_empty());
            }
        }

        #[test]
        fn prop_allowed_keys_always_parse(raw in "[A-Za-z0-9_]{1,64}") {
            prop_assert!(ScopeKey::parse(&raw).is_ok());
        }
    }
}
