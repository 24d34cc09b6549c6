//! Architecture, asset and security attribute models

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{Level, UnknownVariant};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Acceptable financial risk for the whole architecture
    pub risk_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub architecture_id: Uuid,
    pub name: String,
    pub criticality: Level,
}

/// CIA-style property protected on an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Confidentiality,
    Integrity,
    Availability,
    Authenticity,
    Traceability,
    Other,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Confidentiality => "confidentiality",
            AttributeKind::Integrity => "integrity",
            AttributeKind::Availability => "availability",
            AttributeKind::Authenticity => "authenticity",
            AttributeKind::Traceability => "traceability",
            AttributeKind::Other => "other",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confidentiality" => Ok(AttributeKind::Confidentiality),
            "integrity" => Ok(AttributeKind::Integrity),
            "availability" => Ok(AttributeKind::Availability),
            "authenticity" => Ok(AttributeKind::Authenticity),
            "traceability" => Ok(AttributeKind::Traceability),
            "other" => Ok(AttributeKind::Other),
            _ => Err(UnknownVariant::new("attribute kind", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAttribute {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub kind: AttributeKind,
    /// Monetary loss if the attribute is compromised; used as a risk ceiling
    pub compromise_cost: f64,
    pub priority: Level,
}
