//! Implementation record rows

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use secopt_core::models::{ImplementationRecord, NewImplementation};
use secopt_core::StoreError;

use super::parse_column;

#[derive(Debug, Clone, FromRow)]
pub struct ImplementationRow {
    pub id: Uuid,
    pub attribute_threat_id: Uuid,
    pub measure_id: Uuid,
    pub status: String,
    pub completion: f64,
    pub owner_id: Option<Uuid>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ImplementationRow {
    /// Insert a planned record; `None` when the (link, measure) pair already exists
    pub async fn insert_planned(
        conn: &mut PgConnection,
        draft: &NewImplementation,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ImplementationRow>(
            r#"
            INSERT INTO implementations (attribute_threat_id, measure_id, status, completion, owner_id, comment)
            VALUES ($1, $2, 'planned', 0, $3, $4)
            ON CONFLICT (attribute_threat_id, measure_id) DO NOTHING
            RETURNING id, attribute_threat_id, measure_id, status, completion, owner_id, comment, created_at
            "#
        )
        .bind(draft.attribute_threat_id)
        .bind(draft.measure_id)
        .bind(draft.owner_id)
        .bind(&draft.comment)
        .fetch_optional(conn)
        .await
    }
}

impl TryFrom<ImplementationRow> for ImplementationRecord {
    type Error = StoreError;

    fn try_from(row: ImplementationRow) -> Result<Self, Self::Error> {
        Ok(ImplementationRecord {
            status: parse_column(&row.status)?,
            id: row.id,
            attribute_threat_id: row.attribute_threat_id,
            measure_id: row.measure_id,
            completion: row.completion,
            owner_id: row.owner_id,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}
