//! Shared document library.

use std::sync::Arc;

use portal_cache::CacheConfig;
use portal_core::constants::DOCUMENT_MAX_UPLOAD_BYTES;
use portal_core::traits::{AuditLogger, RecordStore, ResourceStore};
use portal_core::types::{Actor, DocumentItem};

use crate::records::RecordService;

/// Documents with year / source / platform / version metadata.
pub type DocumentService = RecordService<DocumentItem>;

impl RecordService<DocumentItem> {
    /// Creates the document service with the document upload limit.
    pub fn documents(
        records: Arc<dyn RecordStore<DocumentItem>>,
        resources: Arc<dyn ResourceStore>,
        audit: Arc<dyn AuditLogger>,
        actor: Actor,
        config: CacheConfig,
    ) -> Self {
        Self::new(records, resources, audit, actor, config, DOCUMENT_MAX_UPLOAD_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use chrono::{Duration, Utc};
    use portal_core::traits::{RecordDraft as _, RecordStore as _};
    use portal_core::types::{AuditAction, DocumentDraft, ResourceLocation, UploadFile};
    use tokio::task::JoinSet;

    fn service(fx: &Fixture<DocumentItem>) -> DocumentService {
        DocumentService::documents(
            fx.records.clone(),
            fx.resources.clone(),
            fx.audit.clone(),
            actor(),
            CacheConfig::default(),
        )
    }

    fn seed(draft: DocumentDraft) -> DocumentItem {
        draft.into_record("seed.pdf", ResourceLocation::new("seed_seed.pdf"), Utc::now())
    }

    fn draft(year: i32) -> DocumentDraft {
        DocumentDraft {
            year,
            source: "Vendor".into(),
            platform: "X1".into(),
            version: "A01".into(),
        }
    }

    #[tokio::test]
    async fn test_upload_limit() {
        let fx = Fixture::<DocumentItem>::new();
        assert_eq!(service(&fx).max_upload_bytes(), 500 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_list_is_cached_and_newest_first() {
        let fx = Fixture::<DocumentItem>::new();
        let base = Utc::now();
        for (year, minutes) in [(2022, 0), (2024, 10), (2023, 5)] {
            fx.records
                .inner
                .insert(DocumentItem {
                    id: 0,
                    year,
                    source: "V".into(),
                    platform: "P".into(),
                    version: "1".into(),
                    file_name: format!("{year}.pdf"),
                    location: ResourceLocation::new(format!("x_{year}.pdf")),
                    upload_time: base + Duration::minutes(minutes),
                })
                .await
                .unwrap();
        }
        let svc = service(&fx);

        let first = svc.list(false).await;
        let years: Vec<i32> = first.iter().map(|d| d.year).collect();
        assert_eq!(years, vec![2024, 2023, 2022]);

        let second = svc.list(false).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fx.records.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_invalidates_list() {
        let fx = Fixture::<DocumentItem>::new();
        let svc = service(&fx);

        assert!(svc.list(false).await.is_empty());
        let stored = svc
            .upload(UploadFile::new("spec.pdf", b"%PDF".to_vec()), draft(2024))
            .await
            .unwrap();

        let listed = svc.list(false).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stored.id);
        assert_eq!(fx.records.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_cache() {
        let fx = Fixture::<DocumentItem>::new();
        let svc = service(&fx);
        svc.list(false).await;

        fx.records.fail_inserts(true);
        assert!(svc
            .upload(UploadFile::new("spec.pdf", b"%PDF".to_vec()), draft(2024))
            .await
            .is_err());

        svc.list(false).await;
        assert_eq!(fx.records.list_calls(), 1);
        assert_eq!(fx.resources.len(), 0);
    }

    #[tokio::test]
    async fn test_list_failure_degrades_to_empty() {
        let fx = Fixture::<DocumentItem>::new();
        fx.records
            .inner
            .insert(seed(draft(2024)))
            .await
            .unwrap();
        fx.records.fail_lists(true);
        let svc = service(&fx);

        assert!(svc.list(false).await.is_empty());
        // Empty result is cached; the store recovers but is not asked again
        fx.records.fail_lists(false);
        assert!(svc.list(false).await.is_empty());
        assert_eq!(fx.records.list_calls(), 1);

        assert_eq!(svc.list(true).await.len(), 1);
        assert_eq!(svc.cache_stats().failures, 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_and_second_delete_is_noop() {
        let fx = Fixture::<DocumentItem>::new();
        let svc = service(&fx);
        let stored = svc
            .upload(UploadFile::new("spec.pdf", b"%PDF".to_vec()), draft(2024))
            .await
            .unwrap();
        assert_eq!(svc.list(false).await.len(), 1);

        assert!(svc.delete(stored.id).await.unwrap().is_deleted());
        assert!(svc.list(false).await.is_empty());
        assert_eq!(
            svc.delete(stored.id).await.unwrap(),
            crate::DeleteOutcome::NotFound
        );
        assert_eq!(
            fx.audit_actions(),
            vec![AuditAction::Upload, AuditAction::Delete]
        );
    }

    #[tokio::test]
    async fn test_find_and_log_open() {
        let fx = Fixture::<DocumentItem>::new();
        let svc = service(&fx);
        let stored = svc
            .upload(UploadFile::new("spec.pdf", b"%PDF".to_vec()), draft(2024))
            .await
            .unwrap();

        let found = svc.find(stored.id).await.unwrap();
        svc.log_open(&found).await;

        assert!(svc.find(999).await.is_none());
        let audits = fx.audit_records();
        assert_eq!(audits.last().map(|a| a.action), Some(AuditAction::Open));
        assert_eq!(audits.last().map(|a| a.actor.department.as_str()), Some("PWR"));
        assert_eq!(
            audits.last().and_then(|a| a.subject.attributes.get("year").cloned()),
            Some("2024".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_share_one_load() {
        let fx = Fixture::<DocumentItem>::new();
        let svc = Arc::new(service(&fx));

        let mut set = JoinSet::new();
        for _ in 0..50 {
            let svc = Arc::clone(&svc);
            set.spawn(async move { svc.list(false).await });
        }
        let mut lists = Vec::new();
        while let Some(list) = set.join_next().await {
            lists.push(list.unwrap());
        }

        assert_eq!(fx.records.list_calls(), 1);
        assert!(lists.iter().all(|l| Arc::ptr_eq(l, &lists[0])));
    }
}
