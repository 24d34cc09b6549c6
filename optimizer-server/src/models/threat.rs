//! Attribute-threat and threat-measure rows

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use secopt_core::models::{AttributeThreatLink, ControlMeasure, ThreatMeasureLink};
use secopt_core::StoreError;

use super::parse_column;

#[derive(Debug, Clone, FromRow)]
pub struct AttributeThreatRow {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub threat_id: Uuid,
    pub probability: f64,
    pub impact: f64,
    pub impact_cost: f64,
}

const LINK_COLUMNS: &str = "id, attribute_id, threat_id, probability, impact, impact_cost";

impl AttributeThreatRow {
    pub async fn list_by_attribute(pool: &PgPool, attribute_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM attribute_threats WHERE attribute_id = $1", LINK_COLUMNS);
        sqlx::query_as::<_, AttributeThreatRow>(&sql)
            .bind(attribute_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, attribute_id: Uuid, threat_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM attribute_threats WHERE attribute_id = $1 AND threat_id = $2",
            LINK_COLUMNS
        );
        sqlx::query_as::<_, AttributeThreatRow>(&sql)
            .bind(attribute_id)
            .bind(threat_id)
            .fetch_optional(pool)
            .await
    }
}

impl From<AttributeThreatRow> for AttributeThreatLink {
    fn from(row: AttributeThreatRow) -> Self {
        AttributeThreatLink {
            id: row.id,
            attribute_id: row.attribute_id,
            threat_id: row.threat_id,
            probability: row.probability,
            impact: row.impact,
            impact_cost: row.impact_cost,
        }
    }
}

/// Threat-measure link joined with the measure it points at
#[derive(Debug, Clone, FromRow)]
pub struct ThreatMeasureRow {
    pub threat_id: Uuid,
    pub link_efficacy: f64,
    pub compliance: String,
    pub id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub nature: String,
    pub implementation_cost: f64,
    pub annual_maintenance_cost: f64,
    pub efficacy: f64,
    pub duration_days: i32,
}

impl ThreatMeasureRow {
    pub async fn list_by_threat(pool: &PgPool, threat_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ThreatMeasureRow>(
            r#"
            SELECT tm.threat_id, tm.efficacy AS link_efficacy, tm.compliance,
                   m.id, m.code, m.name, m.nature, m.implementation_cost,
                   m.annual_maintenance_cost, m.efficacy, m.duration_days
            FROM threat_measures tm
            JOIN control_measures m ON tm.measure_id = m.id
            WHERE tm.threat_id = $1
            "#
        )
        .bind(threat_id)
        .fetch_all(pool)
        .await
    }
}

impl TryFrom<ThreatMeasureRow> for ThreatMeasureLink {
    type Error = StoreError;

    fn try_from(row: ThreatMeasureRow) -> Result<Self, Self::Error> {
        Ok(ThreatMeasureLink {
            threat_id: row.threat_id,
            efficacy: row.link_efficacy,
            compliance: parse_column(&row.compliance)?,
            measure: ControlMeasure {
                id: row.id,
                code: row.code,
                name: row.name,
                nature: row.nature,
                implementation_cost: row.implementation_cost,
                annual_maintenance_cost: row.annual_maintenance_cost,
                efficacy: row.efficacy,
                duration_days: u32::try_from(row.duration_days).unwrap_or(0),
            },
        })
    }
}
