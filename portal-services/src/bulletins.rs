//! Department bulletins.

use std::sync::Arc;

use portal_cache::CacheConfig;
use portal_core::constants::BULLETIN_MAX_UPLOAD_BYTES;
use portal_core::traits::{AuditLogger, RecordStore, ResourceStore};
use portal_core::types::{Actor, BulletinItem};

use crate::records::RecordService;

/// Bulletins posted per department. Audit entries carry the bulletin's
/// department rather than the user's.
pub type BulletinService = RecordService<BulletinItem>;

impl RecordService<BulletinItem> {
    /// Creates the bulletin service with the bulletin upload limit.
    pub fn bulletins(
        records: Arc<dyn RecordStore<BulletinItem>>,
        resources: Arc<dyn ResourceStore>,
        audit: Arc<dyn AuditLogger>,
        actor: Actor,
        config: CacheConfig,
    ) -> Self {
        Self::new(records, resources, audit, actor, config, BULLETIN_MAX_UPLOAD_BYTES)
    }
}
