//! Implementation tracking records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationStatus {
    #[default]
    Planned,
    InProgress,
    Implemented,
    Verified,
    Cancelled,
}

impl ImplementationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationStatus::Planned => "planned",
            ImplementationStatus::InProgress => "in_progress",
            ImplementationStatus::Implemented => "implemented",
            ImplementationStatus::Verified => "verified",
            ImplementationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ImplementationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(ImplementationStatus::Planned),
            "in_progress" => Ok(ImplementationStatus::InProgress),
            "implemented" | "done" => Ok(ImplementationStatus::Implemented),
            "verified" => Ok(ImplementationStatus::Verified),
            "cancelled" | "canceled" => Ok(ImplementationStatus::Cancelled),
            _ => Err(UnknownVariant::new("implementation status", s)),
        }
    }
}

/// One selected measure scheduled against one attribute-threat link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationRecord {
    pub id: Uuid,
    pub attribute_threat_id: Uuid,
    pub measure_id: Uuid,
    pub status: ImplementationStatus,
    pub completion: f64,
    pub owner_id: Option<Uuid>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewImplementation {
    pub attribute_threat_id: Uuid,
    pub measure_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub comment: Option<String>,
}

impl NewImplementation {
    /// Records created this way start planned at 0 %
    pub fn planned(attribute_threat_id: Uuid, measure_id: Uuid, owner_id: Option<Uuid>) -> Self {
        Self {
            attribute_threat_id,
            measure_id,
            owner_id,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
