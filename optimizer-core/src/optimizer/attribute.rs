//! Per-attribute optimization
//!
//! ```text
//! EfficacyFloor:  min  sum(cost_i x_i)   s.t.  sum(efficacy_i x_i) >= floor
//! Coverage:       min  sum(cost_i x_i)   s.t.  for each threat t: sum(x_i | i covers t) >= 1
//! ```
//!
//! Every failure is folded into the returned `Outcome`; nothing here errors.

use std::collections::HashSet;
use uuid::Uuid;

use super::candidates::build_candidate_set;
use super::types::{CandidateSet, Formulation, OptimizationResult, Outcome, Selection};
use super::SecurityOptimizer;
use crate::constants::SELECTION_THRESHOLD;
use crate::error::{OptimizerError, OptimizerResult, SolverError};
use crate::models::SecurityAttribute;
use crate::solver::{Domain, MipModel, Relation, Sense, SolveOutcome, TerminationCondition};

impl SecurityOptimizer {
    /// Optimize one security attribute
    pub async fn optimize_attribute(
        &self,
        attribute: &SecurityAttribute,
        formulation: Formulation,
    ) -> OptimizationResult {
        if !self.solver.is_available() {
            return OptimizationResult::new(attribute.id, formulation, Outcome::SolverUnavailable);
        }

        let set = match build_candidate_set(self.store.as_ref(), attribute).await {
            Ok(set) => set,
            Err(e) => {
                tracing::error!("Failed to load candidates for attribute {}: {}", attribute.id, e);
                return OptimizationResult::new(
                    attribute.id,
                    formulation,
                    Outcome::Error { message: e.to_string() },
                );
            }
        };

        let outcome = self.solve_candidates(attribute.id, &set, formulation).await;
        tracing::debug!("Attribute {} optimized: {}", attribute.id, outcome.status());

        OptimizationResult {
            attribute_id: attribute.id,
            formulation,
            candidates_analyzed: set.candidates.len(),
            threats_analyzed: set.threats_analyzed(),
            measures_rejected: set.measures_rejected,
            exposure: set.exposure,
            outcome,
        }
    }

    /// Look the attribute up, then optimize it
    pub async fn optimize_attribute_by_id(
        &self,
        attribute_id: Uuid,
        formulation: Formulation,
    ) -> OptimizerResult<OptimizationResult> {
        let attribute = self
            .store
            .get_attribute(attribute_id)
            .await?
            .ok_or(OptimizerError::AttributeNotFound(attribute_id))?;
        Ok(self.optimize_attribute(&attribute, formulation).await)
    }

    async fn solve_candidates(
        &self,
        attribute_id: Uuid,
        set: &CandidateSet,
        formulation: Formulation,
    ) -> Outcome {
        if set.threat_ids.is_empty() {
            return Outcome::NoMenaces;
        }
        if set.candidates.is_empty() {
            return Outcome::NoValidMeasures;
        }

        let Some(model) = build_attribute_model(set, formulation, self.config.efficacy_floor) else {
            return Outcome::Infeasible { termination: TerminationCondition::Infeasible };
        };

        match self.solve_model(model).await {
            Ok(solved) => fold_solution(set, solved),
            Err(SolverError::Unavailable) => Outcome::SolverUnavailable,
            Err(e) => {
                let measures: Vec<String> =
                    set.candidates.iter().map(|c| c.measure_id.to_string()).collect();
                tracing::error!(
                    "Solver failed on attribute {} ({}, measures [{}]): {}",
                    attribute_id,
                    formulation.as_str(),
                    measures.join(", "),
                    e
                );
                Outcome::Error { message: e.to_string() }
            }
        }
    }
}

/// Build the model for a candidate set. `None` when a threat has no
/// candidate at all under `Coverage`, which no assignment can satisfy.
pub fn build_attribute_model(
    set: &CandidateSet,
    formulation: Formulation,
    efficacy_floor: f64,
) -> Option<MipModel> {
    let mut model = MipModel::new(format!("attribute_{}", formulation.as_str()), Sense::Minimize);
    for (i, candidate) in set.candidates.iter().enumerate() {
        let x = model.add_variable(format!("x{}", i), Domain::Binary);
        model.add_objective_term(x, candidate.cost);
    }

    match formulation {
        Formulation::EfficacyFloor => {
            let terms = set
                .candidates
                .iter()
                .enumerate()
                .map(|(i, c)| (i, c.efficacy))
                .collect();
            model.add_constraint("efficacy_floor", terms, Relation::GreaterEq, efficacy_floor);
        }
        Formulation::Coverage => {
            for (t, threat_id) in set.threat_ids.iter().enumerate() {
                let terms: Vec<(usize, f64)> = set
                    .candidates
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.covers(*threat_id))
                    .map(|(i, _)| (i, 1.0))
                    .collect();
                if terms.is_empty() {
                    tracing::debug!("Threat {} has no valid measure; coverage impossible", threat_id);
                    return None;
                }
                model.add_constraint(format!("cover_t{}", t), terms, Relation::GreaterEq, 1.0);
            }
        }
    }

    Some(model)
}

fn fold_solution(set: &CandidateSet, solved: SolveOutcome) -> Outcome {
    if !solved.termination.is_optimal() {
        return Outcome::Infeasible { termination: solved.termination };
    }

    let selected: Vec<_> = set
        .candidates
        .iter()
        .zip(&solved.values)
        .filter(|(_, value)| **value > SELECTION_THRESHOLD)
        .map(|(candidate, _)| candidate.clone())
        .collect();

    let total_cost: f64 = selected.iter().map(|c| c.cost).sum();
    let total_efficacy: f64 = selected.iter().map(|c| c.efficacy).sum();
    let combined: f64 = selected
        .iter()
        .map(|c| c.efficacy / 100.0 * (c.threat_efficacy / 100.0))
        .sum();
    let threats_covered = selected
        .iter()
        .flat_map(|c| c.covered_threats.iter().copied())
        .collect::<HashSet<_>>()
        .len();

    Outcome::Optimal(Selection {
        objective_value: solved.objective_value.unwrap_or(total_cost),
        selected_measures: selected,
        total_cost,
        total_efficacy,
        estimated_risk_reduction: (combined * 100.0).min(100.0),
        threats_covered,
    })
}
