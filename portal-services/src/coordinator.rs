//! Upload and delete paths keeping a physical resource and its metadata
//! record consistent.
//!
//! Upload writes the resource first and the record second; if the record
//! cannot be persisted the resource is removed again. Delete removes the
//! record first and the resource second; a resource left behind is logged,
//! never resurrected.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use portal_core::error::{PortalError, Result};
use portal_core::traits::{
    AuditLogger, CacheInvalidator, Record, RecordDraft, RecordStore, ResourceStore,
};
use portal_core::types::{sanitize_file_name, Actor, AuditAction, AuditRecord, PendingWrite};

/// Result of a delete call that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No record with that id. Nothing was touched or audited.
    NotFound,
    /// The record vanished between lookup and delete (removed concurrently).
    AlreadyRemoved,
    /// The record was deleted.
    Deleted {
        /// Whether the physical resource was also removed
        resource_removed: bool,
    },
}

impl DeleteOutcome {
    /// Returns true if this call deleted the record.
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

/// Two-step writer for one record kind.
pub struct MutationCoordinator<R: Record> {
    records: Arc<dyn RecordStore<R>>,
    resources: Arc<dyn ResourceStore>,
    audit: Arc<dyn AuditLogger>,
    invalidator: Arc<dyn CacheInvalidator>,
    actor: Actor,
    max_payload: usize,
}

impl<R: Record> MutationCoordinator<R> {
    /// Creates a coordinator.
    ///
    /// `invalidator` is called after every successful mutation.
    pub fn new(
        records: Arc<dyn RecordStore<R>>,
        resources: Arc<dyn ResourceStore>,
        audit: Arc<dyn AuditLogger>,
        invalidator: Arc<dyn CacheInvalidator>,
        actor: Actor,
        max_payload: usize,
    ) -> Self {
        Self {
            records,
            resources,
            audit,
            invalidator,
            actor,
            max_payload,
        }
    }

    /// Largest accepted payload, in bytes.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// The acting user.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    fn actor_for(&self, record: &R) -> Actor {
        match record.audit_department() {
            Some(department) => Actor {
                department: department.to_string(),
                ..self.actor.clone()
            },
            None => self.actor.clone(),
        }
    }

    async fn write_audit(&self, action: AuditAction, record: &R) {
        let entry = AuditRecord::now(self.actor_for(record), action, record.audit_subject());
        self.audit.log(entry).await;
    }

    /// Stores the resource, then its record.
    ///
    /// Size, draft fields, and file name are checked before any I/O. If the
    /// record cannot be inserted the resource is deleted (best-effort), the
    /// cache is left alone, and a mutation error is returned.
    #[instrument(skip(self, write), fields(kind = R::KIND, name = %write.file.name, size = write.file.len()))]
    pub async fn upload<D>(&self, write: PendingWrite<D>) -> Result<R>
    where
        D: RecordDraft<Record = R>,
    {
        let PendingWrite { file, draft } = write;

        if file.len() > self.max_payload {
            return Err(PortalError::PayloadTooLarge {
                limit: self.max_payload,
                actual: file.len(),
            });
        }
        draft.validate()?;
        let safe_name = sanitize_file_name(&file.name)?;

        let location = self
            .resources
            .put(&file.bytes, &safe_name)
            .await
            .map_err(|e| PortalError::mutation("store resource", e))?;

        let mut record = draft.into_record(&file.name, location.clone(), Utc::now());

        match self.records.insert(record.clone()).await {
            Ok(id) => record.set_id(id),
            Err(e) => {
                error!(%location, error = %e, "record insert failed, removing resource");
                match self.resources.delete(&location).await {
                    Ok(_) => info!(%location, "orphaned resource removed"),
                    Err(cleanup) => {
                        error!(%location, error = %cleanup, "could not remove orphaned resource")
                    }
                }
                return Err(PortalError::mutation("insert record", e));
            }
        }

        info!(id = record.id(), %location, "upload stored");
        self.write_audit(AuditAction::Upload, &record).await;
        self.invalidator.invalidate();
        Ok(record)
    }

    /// Deletes the record with `id`, then its resource.
    ///
    /// The delete is audited before the record is removed. Resource removal
    /// is best-effort and never fails the call.
    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn delete(&self, id: u64) -> Result<DeleteOutcome> {
        let record = match self
            .records
            .get(id)
            .await
            .map_err(|e| PortalError::mutation("look up record", e))?
        {
            Some(record) => record,
            None => {
                warn!(id, "delete requested for unknown record");
                return Ok(DeleteOutcome::NotFound);
            }
        };

        self.write_audit(AuditAction::Delete, &record).await;

        let affected = self
            .records
            .delete(id)
            .await
            .map_err(|e| PortalError::mutation("delete record", e))?;
        if affected == 0 {
            warn!(id, "record already removed by someone else");
            return Ok(DeleteOutcome::AlreadyRemoved);
        }

        info!(id, "record deleted");
        self.invalidator.invalidate();

        let resource_removed = match record.location() {
            None => false,
            Some(location) => match self.resources.delete(location).await {
                Ok(true) => {
                    info!(%location, "resource removed");
                    true
                }
                Ok(false) => {
                    warn!(%location, "resource already missing");
                    false
                }
                Err(e) => {
                    error!(%location, error = %e, "resource removal failed");
                    false
                }
            },
        };

        Ok(DeleteOutcome::Deleted { resource_removed })
    }

    /// Records that `record` was opened.
    pub async fn log_open(&self, record: &R) {
        self.write_audit(AuditAction::Open, record).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use portal_core::types::{BulletinDraft, BulletinItem, DocumentDraft, DocumentItem, UploadFile};

    fn document_draft() -> DocumentDraft {
        DocumentDraft {
            year: 2024,
            source: "Vendor".into(),
            platform: "X1".into(),
            version: "A01".into(),
        }
    }

    fn coordinator<R: Record>(fx: &Fixture<R>, max_payload: usize) -> MutationCoordinator<R> {
        MutationCoordinator::new(
            fx.records.clone(),
            fx.resources.clone(),
            fx.audit.clone(),
            fx.invalidator.clone(),
            actor(),
            max_payload,
        )
    }

    #[tokio::test]
    async fn test_upload_stores_resource_record_and_audits() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);

        let write = PendingWrite::new(UploadFile::new("spec.pdf", b"pdf".to_vec()), document_draft());
        let record = coord.upload(write).await.unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.file_name, "spec.pdf");
        assert!(record.location.as_str().ends_with("_spec.pdf"));
        assert!(fx.resources.contains(&record.location));
        assert_eq!(fx.records.inner.len(), 1);
        assert_eq!(fx.audit_actions(), vec![AuditAction::Upload]);
        assert_eq!(fx.invalidator.count(), 1);
    }

    #[tokio::test]
    async fn test_upload_rolls_back_resource_on_insert_failure() {
        let fx = Fixture::<DocumentItem>::new();
        fx.records.fail_inserts(true);
        let coord = coordinator(&fx, 1024);

        let write = PendingWrite::new(UploadFile::new("spec.pdf", b"pdf".to_vec()), document_draft());
        let err = coord.upload(write).await.unwrap_err();

        assert!(matches!(err, PortalError::MutationError { .. }));
        assert_eq!(fx.resources.len(), 0);
        assert_eq!(fx.resources.deletes(), 1);
        assert!(fx.audit_records().is_empty());
        assert_eq!(fx.invalidator.count(), 0);
    }

    #[tokio::test]
    async fn test_upload_resource_failure_has_no_side_effects() {
        let fx = Fixture::<DocumentItem>::new();
        fx.resources.fail_puts(true);
        let coord = coordinator(&fx, 1024);

        let write = PendingWrite::new(UploadFile::new("spec.pdf", b"pdf".to_vec()), document_draft());
        let err = coord.upload(write).await.unwrap_err();

        assert!(matches!(err, PortalError::MutationError { .. }));
        assert!(fx.records.inner.is_empty());
        assert!(fx.audit_records().is_empty());
        assert_eq!(fx.invalidator.count(), 0);
    }

    #[tokio::test]
    async fn test_upload_validation_before_io() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 4);

        let too_big = PendingWrite::new(UploadFile::new("a.pdf", vec![0u8; 5]), document_draft());
        assert!(matches!(
            coord.upload(too_big).await,
            Err(PortalError::PayloadTooLarge { limit: 4, actual: 5 })
        ));

        let mut bad_draft = document_draft();
        bad_draft.source = " ".into();
        let invalid = PendingWrite::new(UploadFile::new("a.pdf", vec![0u8; 1]), bad_draft);
        assert!(coord.upload(invalid).await.unwrap_err().is_validation_error());

        let bad_name = PendingWrite::new(UploadFile::new("///", vec![0u8; 1]), document_draft());
        assert!(coord.upload(bad_name).await.unwrap_err().is_validation_error());

        assert_eq!(fx.resources.puts(), 0);
        assert!(fx.records.inner.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);

        assert_eq!(coord.delete(42).await.unwrap(), DeleteOutcome::NotFound);
        assert!(fx.audit_records().is_empty());
        assert_eq!(fx.resources.deletes(), 0);
        assert_eq!(fx.invalidator.count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_record_then_resource() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);
        let write = PendingWrite::new(UploadFile::new("spec.pdf", b"pdf".to_vec()), document_draft());
        let record = coord.upload(write).await.unwrap();

        let outcome = coord.delete(record.id).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { resource_removed: true });
        assert!(fx.records.inner.is_empty());
        assert!(!fx.resources.contains(&record.location));
        assert_eq!(fx.audit_actions(), vec![AuditAction::Upload, AuditAction::Delete]);
        assert_eq!(fx.invalidator.count(), 2);

        // Second delete of the same id
        assert_eq!(coord.delete(record.id).await.unwrap(), DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_or_failing_resource() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);
        let first = coord
            .upload(PendingWrite::new(UploadFile::new("a.pdf", b"a".to_vec()), document_draft()))
            .await
            .unwrap();
        let second = coord
            .upload(PendingWrite::new(UploadFile::new("b.pdf", b"b".to_vec()), document_draft()))
            .await
            .unwrap();

        fx.resources.remove_silently(&first.location);
        assert_eq!(
            coord.delete(first.id).await.unwrap(),
            DeleteOutcome::Deleted { resource_removed: false }
        );

        fx.resources.fail_deletes(true);
        assert_eq!(
            coord.delete(second.id).await.unwrap(),
            DeleteOutcome::Deleted { resource_removed: false }
        );
        // The record stays deleted
        assert!(fx.records.inner.is_empty());
    }

    #[tokio::test]
    async fn test_delete_zero_affected_is_already_removed() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);
        let record = coord
            .upload(PendingWrite::new(UploadFile::new("a.pdf", b"a".to_vec()), document_draft()))
            .await
            .unwrap();

        fx.records.report_zero_deletes(true);
        let outcome = coord.delete(record.id).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::AlreadyRemoved);
        // Audited, but nothing invalidated and the resource kept
        assert_eq!(fx.audit_actions(), vec![AuditAction::Upload, AuditAction::Delete]);
        assert_eq!(fx.invalidator.count(), 1);
        assert!(fx.resources.contains(&record.location));
    }

    #[tokio::test]
    async fn test_delete_store_error_propagates() {
        let fx = Fixture::<DocumentItem>::new();
        let coord = coordinator(&fx, 1024);
        let record = coord
            .upload(PendingWrite::new(UploadFile::new("a.pdf", b"a".to_vec()), document_draft()))
            .await
            .unwrap();

        fx.records.fail_deletes(true);
        let err = coord.delete(record.id).await.unwrap_err();

        assert!(matches!(err, PortalError::MutationError { .. }));
        assert!(fx.resources.contains(&record.location));
        assert_eq!(fx.invalidator.count(), 1);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_mutation() {
        let fx = Fixture::<DocumentItem>::with_broken_audit();
        let coord = coordinator(&fx, 1024);

        let record = coord
            .upload(PendingWrite::new(UploadFile::new("a.pdf", b"a".to_vec()), document_draft()))
            .await
            .unwrap();
        assert!(coord.delete(record.id).await.unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_bulletin_audit_uses_bulletin_department() {
        let fx = Fixture::<BulletinItem>::new();
        let coord = coordinator(&fx, 1024);

        let write = PendingWrite::new(
            UploadFile::new("notice.pdf", b"n".to_vec()),
            BulletinDraft { department: "SW".into() },
        );
        let record = coord.upload(write).await.unwrap();
        coord.log_open(&record).await;

        let audits = fx.audit_records();
        assert_eq!(audits.len(), 2);
        assert!(audits.iter().all(|a| a.actor.department == "SW"));
        assert_eq!(audits[0].actor.user_name, "amy");
        assert_eq!(audits[1].action, AuditAction::Open);
    }
}
