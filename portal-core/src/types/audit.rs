//! Audit trail records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user performing an action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Login name
    pub user_name: String,
    /// Division the user belongs to
    pub division: String,
    /// Department the user belongs to
    pub department: String,
}

impl Actor {
    /// Creates an actor.
    pub fn new(
        user_name: impl Into<String>,
        division: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            division: division.into(),
            department: department.into(),
        }
    }
}

/// Kind of action recorded in the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A resource and its record were stored
    Upload,
    /// A record (and its resource) is about to be removed
    Delete,
    /// A stored resource was opened
    Open,
}

impl AuditAction {
    /// Returns the action name as written to the log.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Upload => "Upload",
            AuditAction::Delete => "Delete",
            AuditAction::Open => "Open",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an audited action touched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSubject {
    /// Record kind ("document", "bulletin")
    pub kind: String,
    /// Human-readable name (original file name)
    pub name: String,
    /// Physical resource location, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Descriptive fields of the record
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// One entry of the append-only audit log. Never read back by the services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Who acted
    pub actor: Actor,
    /// What they did
    pub action: AuditAction,
    /// What they did it to
    pub subject: AuditSubject,
    /// When
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record stamped with the current time.
    pub fn now(actor: Actor, action: AuditAction, subject: AuditSubject) -> Self {
        Self {
            actor,
            action,
            subject,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::Upload.to_string(), "Upload");
        assert_eq!(AuditAction::Delete.as_str(), "Delete");
        assert_eq!(AuditAction::Open.as_str(), "Open");
    }

    #[test]
    fn test_record_serializes_compactly() {
        let record = AuditRecord::now(
            Actor::new("amy", "A31_HWD", "PWR"),
            AuditAction::Open,
            AuditSubject {
                kind: "document".into(),
                name: "spec.pdf".into(),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "Open");
        assert_eq!(json["actor"]["user_name"], "amy");
        assert!(json["subject"].get("location").is_none());
        assert!(json["subject"].get("attributes").is_none());
    }
}
