//! Persistence boundary
//!
//! The optimizer reads architectures, attributes, threats and measures through
//! [`SecurityStore`] and writes implementation records through it. The server
//! provides a PostgreSQL implementation; [`MemoryStore`] backs tests and
//! embedded use.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Architecture, Asset, AttributeThreatLink, ImplementationRecord, NewImplementation,
    SecurityAttribute, ThreatMeasureLink,
};

#[async_trait]
pub trait SecurityStore: Send + Sync {
    async fn get_architecture(&self, id: Uuid) -> Result<Option<Architecture>, StoreError>;

    async fn list_assets(&self, architecture_id: Uuid) -> Result<Vec<Asset>, StoreError>;

    async fn list_attributes(&self, asset_id: Uuid) -> Result<Vec<SecurityAttribute>, StoreError>;

    async fn get_attribute(&self, id: Uuid) -> Result<Option<SecurityAttribute>, StoreError>;

    async fn get_attribute_threats(
        &self,
        attribute_id: Uuid,
    ) -> Result<Vec<AttributeThreatLink>, StoreError>;

    async fn get_threat_measures(&self, threat_id: Uuid) -> Result<Vec<ThreatMeasureLink>, StoreError>;

    async fn get_attribute_threat_link(
        &self,
        attribute_id: Uuid,
        threat_id: Uuid,
    ) -> Result<Option<AttributeThreatLink>, StoreError>;

    /// Insert every draft in one transaction.
    ///
    /// Either all new rows are committed or none are. Drafts whose
    /// (link, measure) pair already has a record are skipped; only the rows
    /// actually created are returned.
    async fn create_implementation_records(
        &self,
        drafts: &[NewImplementation],
    ) -> Result<Vec<ImplementationRecord>, StoreError>;
}
