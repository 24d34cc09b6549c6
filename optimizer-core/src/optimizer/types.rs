//! Optimizer Types
//!
//! Value types crossing the optimization boundary and the results handed
//! back to callers. No logic beyond small accessors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{AttributeKind, ComplianceStatus, Level};
use crate::solver::TerminationCondition;

// ============================================================================
// FORMULATION
// ============================================================================

/// Which per-attribute model to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Formulation {
    /// min cost  s.t.  sum(efficacy) >= floor
    #[default]
    EfficacyFloor,
    /// min cost  s.t.  every threat has at least one selected measure
    Coverage,
}

impl Formulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formulation::EfficacyFloor => "efficacy_floor",
            Formulation::Coverage => "coverage",
        }
    }
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Immutable snapshot of a control measure eligible for one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeasure {
    pub measure_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub nature: String,
    /// 3-year total cost
    pub cost: f64,
    pub efficacy: f64,
    /// First threat through which the measure was reached
    pub threat_id: Uuid,
    pub threat_efficacy: f64,
    pub compliance: ComplianceStatus,
    /// Every threat of the attribute this measure addresses, first one included
    pub covered_threats: Vec<Uuid>,
}

impl CandidateMeasure {
    pub fn covers(&self, threat_id: Uuid) -> bool {
        self.covered_threats.contains(&threat_id)
    }
}

/// Output of the candidate set builder for one attribute
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<CandidateMeasure>,
    /// Distinct threats linked to the attribute, sorted
    pub threat_ids: Vec<Uuid>,
    pub measures_rejected: usize,
    /// Sum of the links' financial risk
    pub exposure: f64,
}

impl CandidateSet {
    pub fn threats_analyzed(&self) -> usize {
        self.threat_ids.len()
    }
}

// ============================================================================
// PER-ATTRIBUTE RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub selected_measures: Vec<CandidateMeasure>,
    pub total_cost: f64,
    pub total_efficacy: f64,
    pub objective_value: f64,
    /// Combined efficacy x efficacy-against-threat, as a percentage capped at 100
    pub estimated_risk_reduction: f64,
    pub threats_covered: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Optimal(Selection),
    Infeasible { termination: TerminationCondition },
    NoMenaces,
    NoValidMeasures,
    SolverUnavailable,
    Error { message: String },
}

impl Outcome {
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Optimal(_) => "optimal",
            Outcome::Infeasible { .. } => "infeasible",
            Outcome::NoMenaces => "no_menaces",
            Outcome::NoValidMeasures => "no_valid_measures",
            Outcome::SolverUnavailable => "solver_unavailable",
            Outcome::Error { .. } => "error",
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Outcome::Optimal(selection) => Some(selection),
            _ => None,
        }
    }
}

/// Result of optimizing one security attribute
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub attribute_id: Uuid,
    pub formulation: Formulation,
    pub candidates_analyzed: usize,
    pub threats_analyzed: usize,
    pub measures_rejected: usize,
    pub exposure: f64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl OptimizationResult {
    pub(crate) fn new(attribute_id: Uuid, formulation: Formulation, outcome: Outcome) -> Self {
        Self {
            attribute_id,
            formulation,
            candidates_analyzed: 0,
            threats_analyzed: 0,
            measures_rejected: 0,
            exposure: 0.0,
            outcome,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self.outcome, Outcome::Optimal(_))
    }

    pub fn status(&self) -> &'static str {
        self.outcome.status()
    }

    pub fn selected_measures(&self) -> &[CandidateMeasure] {
        self.outcome
            .selection()
            .map(|s| s.selected_measures.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_cost(&self) -> f64 {
        self.outcome.selection().map(|s| s.total_cost).unwrap_or(0.0)
    }
}

// ============================================================================
// ARCHITECTURE RESULT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureRequest {
    pub budget: Option<f64>,
    #[serde(default)]
    pub formulation: Formulation,
}

/// One per-attribute run with its asset context
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRun {
    pub asset_id: Uuid,
    pub asset_name: String,
    pub asset_criticality: Level,
    pub attribute_kind: AttributeKind,
    pub attribute_priority: Level,
    pub compromise_cost: f64,
    pub result: OptimizationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub asset_name: String,
    pub attribute_kind: AttributeKind,
    pub measures_count: usize,
    pub cost: f64,
    pub risk_reduction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Distinct measures recommended across the architecture
    pub total_measures: usize,
    /// Sum of per-attribute costs; a measure shared by two attributes counts twice
    pub total_cost: f64,
    pub measures_by_nature: BTreeMap<String, usize>,
    pub recommendations: Vec<Recommendation>,
    pub total_exposure: f64,
    pub risk_tolerance: f64,
    pub exceeds_risk_tolerance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_with_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measures_selected_with_budget: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchitectureOptimization {
    pub architecture_id: Uuid,
    pub architecture_name: String,
    pub formulation: Formulation,
    pub solver_used: Option<String>,
    pub total_assets_processed: usize,
    pub total_attributes_processed: usize,
    pub successful_optimizations: usize,
    pub total_measures_rejected: usize,
    pub attributes: Vec<AttributeRun>,
    /// Deduplicated pool of every selected measure, in first-selection order
    pub recommended_measures: Vec<CandidateMeasure>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_optimization: Option<GlobalOptimization>,
}

// ============================================================================
// GLOBAL BUDGET RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GlobalSelection {
    pub selected_measures: Vec<CandidateMeasure>,
    pub total_cost: f64,
    pub total_efficacy: f64,
    pub budget_used_percentage: f64,
    pub budget_remaining: f64,
    /// Pool size minus selected size
    pub measures_eliminated: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GlobalOutcome {
    Optimal(GlobalSelection),
    NoSolution { termination: TerminationCondition },
    NoMeasures,
    SolverUnavailable,
    Error { message: String },
}

impl GlobalOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            GlobalOutcome::Optimal(_) => "optimal",
            GlobalOutcome::NoSolution { .. } => "no_solution",
            GlobalOutcome::NoMeasures => "no_measures",
            GlobalOutcome::SolverUnavailable => "solver_unavailable",
            GlobalOutcome::Error { .. } => "error",
        }
    }

    pub fn selection(&self) -> Option<&GlobalSelection> {
        match self {
            GlobalOutcome::Optimal(selection) => Some(selection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalOptimization {
    pub budget: f64,
    pub measures_analyzed: usize,
    #[serde(flatten)]
    pub outcome: GlobalOutcome,
}

// ============================================================================
// IMPLEMENTATION PLAN
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImplementationPlan {
    pub implementations_created: usize,
    pub implementation_ids: Vec<Uuid>,
    /// Selected measures whose threat has no link to the attribute
    pub skipped_missing_link: usize,
    /// Pairs that already had an implementation record
    pub skipped_existing: usize,
}

/// Round to cents / hundredths for reporting
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
