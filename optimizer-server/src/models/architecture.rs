//! Architecture, asset and security attribute rows

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use secopt_core::models::{Architecture, Asset, SecurityAttribute};
use secopt_core::StoreError;

use super::parse_column;

#[derive(Debug, Clone, FromRow)]
pub struct ArchitectureRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub risk_tolerance: f64,
}

impl ArchitectureRow {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ArchitectureRow>(
            "SELECT id, name, description, risk_tolerance FROM architectures WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

impl From<ArchitectureRow> for Architecture {
    fn from(row: ArchitectureRow) -> Self {
        Architecture {
            id: row.id,
            name: row.name,
            description: row.description,
            risk_tolerance: row.risk_tolerance,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub architecture_id: Uuid,
    pub name: String,
    pub criticality: String,
}

impl AssetRow {
    pub async fn list_by_architecture(pool: &PgPool, architecture_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AssetRow>(
            r#"
            SELECT id, architecture_id, name, criticality
            FROM assets
            WHERE architecture_id = $1
            ORDER BY created_at, id
            "#
        )
        .bind(architecture_id)
        .fetch_all(pool)
        .await
    }
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        Ok(Asset {
            criticality: parse_column(&row.criticality)?,
            id: row.id,
            architecture_id: row.architecture_id,
            name: row.name,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AttributeRow {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub kind: String,
    pub compromise_cost: f64,
    pub priority: String,
}

const ATTRIBUTE_COLUMNS: &str = "id, asset_id, kind, compromise_cost, priority";

impl AttributeRow {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM security_attributes WHERE id = $1", ATTRIBUTE_COLUMNS);
        sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_asset(pool: &PgPool, asset_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM security_attributes WHERE asset_id = $1 ORDER BY created_at, id",
            ATTRIBUTE_COLUMNS
        );
        sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }
}

impl TryFrom<AttributeRow> for SecurityAttribute {
    type Error = StoreError;

    fn try_from(row: AttributeRow) -> Result<Self, Self::Error> {
        Ok(SecurityAttribute {
            kind: parse_column(&row.kind)?,
            priority: parse_column(&row.priority)?,
            id: row.id,
            asset_id: row.asset_id,
            compromise_cost: row.compromise_cost,
        })
    }
}
