//! In-memory store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use uuid::Uuid;

use super::SecurityStore;
use crate::error::StoreError;
use crate::models::{
    Architecture, Asset, AttributeThreatLink, ComplianceStatus, ControlMeasure,
    ImplementationRecord, ImplementationStatus, NewImplementation, SecurityAttribute,
    ThreatMeasureLink,
};

#[derive(Debug, Default)]
struct Tables {
    architectures: Vec<Architecture>,
    assets: Vec<Asset>,
    attributes: Vec<SecurityAttribute>,
    attribute_threats: Vec<AttributeThreatLink>,
    measures: Vec<ControlMeasure>,
    threat_measures: Vec<StoredThreatMeasure>,
    implementations: Vec<ImplementationRecord>,
}

#[derive(Debug, Clone)]
struct StoredThreatMeasure {
    threat_id: Uuid,
    measure_id: Uuid,
    efficacy: f64,
    compliance: ComplianceStatus,
}

/// Thread-safe store keeping every table in memory.
///
/// Rows come back in insertion order, like an unordered SQL query would on a
/// fresh table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// Fail the batch insert when it reaches this many staged rows
    fail_after: RwLock<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_architecture(&self, architecture: Architecture) {
        self.tables.write().architectures.push(architecture);
    }

    pub fn insert_asset(&self, asset: Asset) {
        self.tables.write().assets.push(asset);
    }

    pub fn insert_attribute(&self, attribute: SecurityAttribute) {
        self.tables.write().attributes.push(attribute);
    }

    pub fn insert_measure(&self, measure: ControlMeasure) {
        let mut tables = self.tables.write();
        tables.measures.retain(|m| m.id != measure.id);
        tables.measures.push(measure);
    }

    pub fn link_attribute_threat(&self, link: AttributeThreatLink) {
        self.tables.write().attribute_threats.push(link);
    }

    pub fn link_threat_measure(
        &self,
        threat_id: Uuid,
        measure_id: Uuid,
        efficacy: f64,
        compliance: ComplianceStatus,
    ) {
        self.tables.write().threat_measures.push(StoredThreatMeasure {
            threat_id,
            measure_id,
            efficacy,
            compliance,
        });
    }

    /// Make the next batch insert fail once `staged` rows are pending
    pub fn fail_inserts_after(&self, staged: usize) {
        *self.fail_after.write() = Some(staged);
    }

    pub fn clear_failure(&self) {
        *self.fail_after.write() = None;
    }

    pub fn implementations(&self) -> Vec<ImplementationRecord> {
        self.tables.read().implementations.clone()
    }
}

#[async_trait]
impl SecurityStore for MemoryStore {
    async fn get_architecture(&self, id: Uuid) -> Result<Option<Architecture>, StoreError> {
        Ok(self.tables.read().architectures.iter().find(|a| a.id == id).cloned())
    }

    async fn list_assets(&self, architecture_id: Uuid) -> Result<Vec<Asset>, StoreError> {
        Ok(self
            .tables
            .read()
            .assets
            .iter()
            .filter(|a| a.architecture_id == architecture_id)
            .cloned()
            .collect())
    }

    async fn list_attributes(&self, asset_id: Uuid) -> Result<Vec<SecurityAttribute>, StoreError> {
        Ok(self
            .tables
            .read()
            .attributes
            .iter()
            .filter(|a| a.asset_id == asset_id)
            .cloned()
            .collect())
    }

    async fn get_attribute(&self, id: Uuid) -> Result<Option<SecurityAttribute>, StoreError> {
        Ok(self.tables.read().attributes.iter().find(|a| a.id == id).cloned())
    }

    async fn get_attribute_threats(
        &self,
        attribute_id: Uuid,
    ) -> Result<Vec<AttributeThreatLink>, StoreError> {
        Ok(self
            .tables
            .read()
            .attribute_threats
            .iter()
            .filter(|l| l.attribute_id == attribute_id)
            .cloned()
            .collect())
    }

    async fn get_threat_measures(&self, threat_id: Uuid) -> Result<Vec<ThreatMeasureLink>, StoreError> {
        let tables = self.tables.read();
        let mut links = Vec::new();
        for stored in tables.threat_measures.iter().filter(|l| l.threat_id == threat_id) {
            let measure = tables
                .measures
                .iter()
                .find(|m| m.id == stored.measure_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("control measure {}", stored.measure_id)))?;
            links.push(ThreatMeasureLink {
                threat_id,
                measure,
                efficacy: stored.efficacy,
                compliance: stored.compliance,
            });
        }
        Ok(links)
    }

    async fn get_attribute_threat_link(
        &self,
        attribute_id: Uuid,
        threat_id: Uuid,
    ) -> Result<Option<AttributeThreatLink>, StoreError> {
        Ok(self
            .tables
            .read()
            .attribute_threats
            .iter()
            .find(|l| l.attribute_id == attribute_id && l.threat_id == threat_id)
            .cloned())
    }

    async fn create_implementation_records(
        &self,
        drafts: &[NewImplementation],
    ) -> Result<Vec<ImplementationRecord>, StoreError> {
        let fail_after = *self.fail_after.read();
        let mut tables = self.tables.write();

        let mut taken: HashSet<(Uuid, Uuid)> = tables
            .implementations
            .iter()
            .map(|r| (r.attribute_threat_id, r.measure_id))
            .collect();

        // Stage everything first; the tables are only touched on success.
        let mut staged = Vec::with_capacity(drafts.len());
        for draft in drafts {
            if fail_after.is_some_and(|limit| staged.len() >= limit) {
                return Err(StoreError::Backend("injected insert failure".to_string()));
            }
            if !tables.attribute_threats.iter().any(|l| l.id == draft.attribute_threat_id) {
                return Err(StoreError::NotFound(format!(
                    "attribute-threat link {}",
                    draft.attribute_threat_id
                )));
            }
            if !taken.insert((draft.attribute_threat_id, draft.measure_id)) {
                continue;
            }
            staged.push(ImplementationRecord {
                id: Uuid::new_v4(),
                attribute_threat_id: draft.attribute_threat_id,
                measure_id: draft.measure_id,
                status: ImplementationStatus::Planned,
                completion: 0.0,
                owner_id: draft.owner_id,
                comment: draft.comment.clone(),
                created_at: Utc::now(),
            });
        }

        tables.implementations.extend(staged.iter().cloned());
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_link() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let link_id = Uuid::new_v4();
        store.link_attribute_threat(AttributeThreatLink {
            id: link_id,
            attribute_id: Uuid::new_v4(),
            threat_id: Uuid::new_v4(),
            probability: 50.0,
            impact: 50.0,
            impact_cost: 1000.0,
        });
        (store, link_id)
    }

    #[test]
    fn test_batch_insert_skips_existing_pairs() {
        let (store, link_id) = store_with_link();
        let measure_id = Uuid::new_v4();
        let draft = NewImplementation::planned(link_id, measure_id, None);

        let first = tokio_test::block_on(store.create_implementation_records(&[draft.clone()])).unwrap();
        let second =
            tokio_test::block_on(store.create_implementation_records(&[draft.clone(), draft])).unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(store.implementations().len(), 1);
    }

    #[test]
    fn test_failed_batch_leaves_nothing_behind() {
        let (store, link_id) = store_with_link();
        store.fail_inserts_after(1);
        let drafts = vec![
            NewImplementation::planned(link_id, Uuid::new_v4(), None),
            NewImplementation::planned(link_id, Uuid::new_v4(), None),
        ];

        let result = tokio_test::block_on(store.create_implementation_records(&drafts));

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(store.implementations().is_empty());
    }

    #[test]
    fn test_unknown_link_is_rejected() {
        let store = MemoryStore::new();
        let drafts = vec![NewImplementation::planned(Uuid::new_v4(), Uuid::new_v4(), None)];
        let result = tokio_test::block_on(store.create_implementation_records(&drafts));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
