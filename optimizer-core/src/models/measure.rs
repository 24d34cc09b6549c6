//! Control measure model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Years of maintenance included in the total cost used by the optimizer
pub const COST_HORIZON_YEARS: f64 = 3.0;

/// Concrete control with its costs and efficacy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMeasure {
    pub id: Uuid,
    pub code: Option<String>,
    pub name: String,
    /// technical / organizational / physical / legal
    pub nature: String,
    pub implementation_cost: f64,
    pub annual_maintenance_cost: f64,
    /// Overall efficacy, 0-100
    pub efficacy: f64,
    /// Implementation duration in days
    pub duration_days: u32,
}

impl ControlMeasure {
    pub fn total_cost_3y(&self) -> f64 {
        self.implementation_cost + self.annual_maintenance_cost * COST_HORIZON_YEARS
    }

    /// Why the measure cannot enter an optimization model, if anything
    pub fn validation_issue(&self) -> Option<&'static str> {
        let cost = self.total_cost_3y();
        if !cost.is_finite() || cost <= 0.0 {
            Some("total 3-year cost must be positive")
        } else if !self.efficacy.is_finite() || self.efficacy <= 0.0 {
            Some("efficacy must be positive")
        } else if self.nature.trim().is_empty() {
            Some("nature is missing")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(implementation: f64, maintenance: f64, efficacy: f64, nature: &str) -> ControlMeasure {
        ControlMeasure {
            id: Uuid::new_v4(),
            code: None,
            name: "m".to_string(),
            nature: nature.to_string(),
            implementation_cost: implementation,
            annual_maintenance_cost: maintenance,
            efficacy,
            duration_days: 30,
        }
    }

    #[test]
    fn test_total_cost_includes_three_years_of_maintenance() {
        assert_eq!(measure(1000.0, 200.0, 50.0, "technical").total_cost_3y(), 1600.0);
    }

    #[test]
    fn test_validity_rules() {
        assert!(measure(10.0, 0.0, 50.0, "technical").validation_issue().is_none());
        assert!(measure(0.0, 5.0, 50.0, "technical").validation_issue().is_none());
        assert!(!measure(0.0, 0.0, 50.0, "technical").validation_issue().is_none());
        assert!(!measure(10.0, 0.0, 0.0, "technical").validation_issue().is_none());
        assert!(!measure(10.0, 0.0, 50.0, "  ").validation_issue().is_none());
        assert!(!measure(f64::NAN, 0.0, 50.0, "legal").validation_issue().is_none());
    }
}
