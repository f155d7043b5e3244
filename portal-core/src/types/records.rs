//! Metadata records served by the portal services.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};
use crate::traits::{Record, RecordDraft};
use crate::types::{AuditSubject, ResourceLocation};

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A document uploaded to the shared document library.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// Unique identifier (assigned by the record store)
    pub id: u64,
    /// Model year the document applies to
    pub year: i32,
    /// Originating vendor or team
    pub source: String,
    /// Hardware platform
    pub platform: String,
    /// Document revision
    pub version: String,
    /// File name as uploaded
    pub file_name: String,
    /// Where the physical file lives
    pub location: ResourceLocation,
    /// When the upload completed
    pub upload_time: DateTime<Utc>,
}

/// Descriptive fields supplied with a document upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentDraft {
    /// Model year
    pub year: i32,
    /// Originating vendor or team
    pub source: String,
    /// Hardware platform
    pub platform: String,
    /// Document revision
    pub version: String,
}

impl Record for DocumentItem {
    const KIND: &'static str = "document";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn location(&self) -> Option<&ResourceLocation> {
        Some(&self.location)
    }

    fn uploaded_at(&self) -> DateTime<Utc> {
        self.upload_time
    }

    fn audit_subject(&self) -> AuditSubject {
        let mut attributes = BTreeMap::new();
        attributes.insert("year".to_string(), self.year.to_string());
        attributes.insert("source".to_string(), self.source.clone());
        attributes.insert("platform".to_string(), self.platform.clone());
        attributes.insert("version".to_string(), self.version.clone());
        AuditSubject {
            kind: Self::KIND.to_string(),
            name: self.file_name.clone(),
            location: Some(self.location.to_string()),
            attributes,
        }
    }
}

impl RecordDraft for DocumentDraft {
    type Record = DocumentItem;

    fn validate(&self) -> Result<()> {
        if !(1900..=9999).contains(&self.year) {
            return Err(PortalError::ValidationError(format!(
                "document year {} out of range",
                self.year
            )));
        }
        for (field, value) in [
            ("source", &self.source),
            ("platform", &self.platform),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(PortalError::ValidationError(format!(
                    "document {} cannot be empty",
                    field
                )));
            }
        }
        Ok(())
    }

    fn into_record(
        self,
        original_name: &str,
        location: ResourceLocation,
        uploaded_at: DateTime<Utc>,
    ) -> DocumentItem {
        DocumentItem {
            id: 0, // Assigned by the record store
            year: self.year,
            source: self.source,
            platform: self.platform,
            version: self.version,
            file_name: original_name.to_string(),
            location,
            upload_time: uploaded_at,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BULLETINS
// ═══════════════════════════════════════════════════════════════════════════════

/// A bulletin posted by a department.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulletinItem {
    /// Unique identifier (assigned by the record store)
    pub id: u64,
    /// Posting department
    pub department: String,
    /// Bulletin title (the uploaded file name)
    pub document: String,
    /// Where the physical file lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ResourceLocation>,
    /// When the upload completed
    pub upload_time: DateTime<Utc>,
}

/// Descriptive fields supplied with a bulletin upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulletinDraft {
    /// Posting department
    pub department: String,
}

impl Record for BulletinItem {
    const KIND: &'static str = "bulletin";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn location(&self) -> Option<&ResourceLocation> {
        self.location.as_ref()
    }

    fn uploaded_at(&self) -> DateTime<Utc> {
        self.upload_time
    }

    fn audit_subject(&self) -> AuditSubject {
        let mut attributes = BTreeMap::new();
        attributes.insert("department".to_string(), self.department.clone());
        AuditSubject {
            kind: Self::KIND.to_string(),
            name: self.document.clone(),
            location: self.location.as_ref().map(ToString::to_string),
            attributes,
        }
    }

    fn audit_department(&self) -> Option<&str> {
        Some(&self.department)
    }
}

impl RecordDraft for BulletinDraft {
    type Record = BulletinItem;

    fn validate(&self) -> Result<()> {
        if self.department.trim().is_empty() {
            return Err(PortalError::ValidationError(
                "bulletin department cannot be empty".into(),
            ));
        }
        Ok(())
    }

    fn into_record(
        self,
        original_name: &str,
        location: ResourceLocation,
        uploaded_at: DateTime<Utc>,
    ) -> BulletinItem {
        BulletinItem {
            id: 0,
            department: self.department,
            document: original_name.to_string(),
            location: Some(location),
            upload_time: uploaded_at,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECOND SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Qualification status of an alternate ("second source") component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondSourceItem {
    /// Row identifier
    pub id: u64,
    /// Year parsed from the leading digits of `date`
    pub year: Option<i32>,
    /// Raw `YYYY_MM_DD` date string
    pub date: Option<String>,
    /// Candidate part number
    pub candidate_pn: String,
    /// Candidate vendor
    pub candidate_vendor: String,
    /// Qualification status
    pub component_status: String,
    /// Main source manufacturer part number
    pub main_source_mpn: String,
    /// Main source company part number
    pub main_source_cpn: String,
    /// Substitution mode
    pub component_substitute_mode: Option<String>,
    /// Owning power department
    pub power_department: Option<String>,
    /// Component type (also the common-pool key)
    pub component_type: Option<String>,
    /// EV-kit report reference
    pub ev_kit_report: Option<String>,
    /// Test motherboard of the main source project
    pub test_mb_of_main_source: Option<String>,
    /// Real-board EA report for the second source
    pub second_source_real_mb_ea_report: Option<String>,
    /// FM/DM comments
    pub power_fm_dm_comments: Option<String>,
    /// Application area remark (asc attachment)
    pub application_area_asc: Option<String>,
    /// Application area remark (txt attachment)
    pub application_area_txt: Option<String>,
}

impl SecondSourceItem {
    /// Derives `year` from the first four characters of `date`.
    pub fn with_year_from_date(mut self) -> Self {
        self.year = self
            .date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok());
        self
    }
}
