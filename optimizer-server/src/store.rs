//! PostgreSQL implementation of the optimizer's persistence boundary

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use secopt_core::models::{
    Architecture, Asset, AttributeThreatLink, ImplementationRecord, NewImplementation,
    SecurityAttribute, ThreatMeasureLink,
};
use secopt_core::{SecurityStore, StoreError};

use crate::models::{
    ArchitectureRow, AssetRow, AttributeRow, AttributeThreatRow, ImplementationRow,
    ThreatMeasureRow,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl SecurityStore for PgStore {
    async fn get_architecture(&self, id: Uuid) -> Result<Option<Architecture>, StoreError> {
        let row = ArchitectureRow::find_by_id(&self.pool, id).await.map_err(backend)?;
        Ok(row.map(Architecture::from))
    }

    async fn list_assets(&self, architecture_id: Uuid) -> Result<Vec<Asset>, StoreError> {
        let rows = AssetRow::list_by_architecture(&self.pool, architecture_id)
            .await
            .map_err(backend)?;
        convert_all(rows)
    }

    async fn list_attributes(&self, asset_id: Uuid) -> Result<Vec<SecurityAttribute>, StoreError> {
        let rows = AttributeRow::list_by_asset(&self.pool, asset_id).await.map_err(backend)?;
        convert_all(rows)
    }

    async fn get_attribute(&self, id: Uuid) -> Result<Option<SecurityAttribute>, StoreError> {
        AttributeRow::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .map(SecurityAttribute::try_from)
            .transpose()
    }

    async fn get_attribute_threats(
        &self,
        attribute_id: Uuid,
    ) -> Result<Vec<AttributeThreatLink>, StoreError> {
        let rows = AttributeThreatRow::list_by_attribute(&self.pool, attribute_id)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(AttributeThreatLink::from).collect())
    }

    async fn get_threat_measures(&self, threat_id: Uuid) -> Result<Vec<ThreatMeasureLink>, StoreError> {
        let rows = ThreatMeasureRow::list_by_threat(&self.pool, threat_id)
            .await
            .map_err(backend)?;
        convert_all(rows)
    }

    async fn get_attribute_threat_link(
        &self,
        attribute_id: Uuid,
        threat_id: Uuid,
    ) -> Result<Option<AttributeThreatLink>, StoreError> {
        let row = AttributeThreatRow::find(&self.pool, attribute_id, threat_id)
            .await
            .map_err(backend)?;
        Ok(row.map(AttributeThreatLink::from))
    }

    async fn create_implementation_records(
        &self,
        drafts: &[NewImplementation],
    ) -> Result<Vec<ImplementationRecord>, StoreError> {
        // Dropping the transaction before commit rolls everything back.
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut created = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let row = ImplementationRow::insert_planned(&mut *tx, draft)
                .await
                .map_err(backend)?;
            if let Some(row) = row {
                created.push(ImplementationRecord::try_from(row)?);
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(created)
    }
}
