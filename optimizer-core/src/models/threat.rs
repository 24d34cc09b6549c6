//! Threat links to attributes and control measures

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{ControlMeasure, UnknownVariant};

/// Attribute <-> threat association with its risk evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeThreatLink {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub threat_id: Uuid,
    /// Probability of occurrence, 0-100
    pub probability: f64,
    /// Impact on the attribute, 0-100
    pub impact: f64,
    /// Estimated financial cost of the impact
    pub impact_cost: f64,
}

impl AttributeThreatLink {
    /// Expected loss: probability x impact cost
    pub fn financial_risk(&self) -> f64 {
        self.probability / 100.0 * self.impact_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    PartiallyCompliant,
    NonCompliant,
    #[default]
    NotApplicable,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::PartiallyCompliant => "partially_compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::NotApplicable => "not_applicable",
        }
    }
}

impl FromStr for ComplianceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compliant" => Ok(ComplianceStatus::Compliant),
            "partially_compliant" | "partial" => Ok(ComplianceStatus::PartiallyCompliant),
            "non_compliant" => Ok(ComplianceStatus::NonCompliant),
            "not_applicable" | "n/a" => Ok(ComplianceStatus::NotApplicable),
            _ => Err(UnknownVariant::new("compliance status", s)),
        }
    }
}

/// A control measure declared effective against one threat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatMeasureLink {
    pub threat_id: Uuid,
    pub measure: ControlMeasure,
    /// Efficacy of the measure against this specific threat, 0-100
    pub efficacy: f64,
    pub compliance: ComplianceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_financial_risk() {
        let link = AttributeThreatLink {
            id: Uuid::nil(),
            attribute_id: Uuid::nil(),
            threat_id: Uuid::nil(),
            probability: 40.0,
            impact: 50.0,
            impact_cost: 10_000.0,
        };
        assert!((link.financial_risk() - 4_000.0).abs() < 1e-9);
    }
}
