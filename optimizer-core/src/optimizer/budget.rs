//! Budget-constrained global selection
//!
//! ```text
//! max  sum(efficacy_i x_i)
//! s.t. sum(cost_i x_i) <= budget
//!      sum(x_i)        >= 1
//! ```
//!
//! The second row keeps "fund nothing" out of the feasible set: a budget
//! below the cheapest measure is reported as `no_solution`.

use super::types::{round2, CandidateMeasure, GlobalOptimization, GlobalOutcome, GlobalSelection};
use super::SecurityOptimizer;
use crate::constants::SELECTION_THRESHOLD;
use crate::error::{OptimizerError, OptimizerResult, SolverError};
use crate::solver::{Domain, MipModel, Relation, Sense, SolveOutcome};

pub fn validate_budget(budget: f64) -> OptimizerResult<f64> {
    if budget.is_finite() && budget >= 0.0 {
        Ok(budget)
    } else {
        Err(OptimizerError::InvalidBudget(budget))
    }
}

impl SecurityOptimizer {
    /// Pick the subset of `pool` with the highest summed efficacy that fits `budget`
    pub async fn optimize_budget(
        &self,
        pool: &[CandidateMeasure],
        budget: f64,
    ) -> OptimizerResult<GlobalOptimization> {
        let budget = validate_budget(budget)?;
        let finish = |outcome| GlobalOptimization {
            budget,
            measures_analyzed: pool.len(),
            outcome,
        };

        if pool.is_empty() {
            return Ok(finish(GlobalOutcome::NoMeasures));
        }

        let outcome = match self.solve_model(build_budget_model(pool, budget)).await {
            Ok(solved) => fold_selection(pool, budget, solved),
            Err(SolverError::Unavailable) => GlobalOutcome::SolverUnavailable,
            Err(e) => {
                tracing::error!(
                    "Global budget optimization failed (budget {}, {} measures): {}",
                    budget,
                    pool.len(),
                    e
                );
                GlobalOutcome::Error { message: e.to_string() }
            }
        };
        Ok(finish(outcome))
    }
}

pub fn build_budget_model(pool: &[CandidateMeasure], budget: f64) -> MipModel {
    let mut model = MipModel::new("global_budget", Sense::Maximize);
    for (i, measure) in pool.iter().enumerate() {
        let x = model.add_variable(format!("x{}", i), Domain::Binary);
        model.add_objective_term(x, measure.efficacy);
    }
    let costs = pool.iter().enumerate().map(|(i, m)| (i, m.cost)).collect();
    model.add_constraint("budget", costs, Relation::LessEq, budget);
    let funding = (0..pool.len()).map(|i| (i, 1.0)).collect();
    model.add_constraint("funding", funding, Relation::GreaterEq, 1.0);
    model
}

fn fold_selection(pool: &[CandidateMeasure], budget: f64, solved: SolveOutcome) -> GlobalOutcome {
    if !solved.termination.is_optimal() {
        tracing::info!("No selection fits budget {} ({})", budget, solved.termination);
        return GlobalOutcome::NoSolution { termination: solved.termination };
    }

    let selected: Vec<CandidateMeasure> = pool
        .iter()
        .zip(&solved.values)
        .filter(|(_, value)| **value > SELECTION_THRESHOLD)
        .map(|(measure, _)| measure.clone())
        .collect();
    let total_cost: f64 = selected.iter().map(|m| m.cost).sum();
    let total_efficacy: f64 = selected.iter().map(|m| m.efficacy).sum();
    let budget_used_percentage = if budget > 0.0 {
        round2(total_cost / budget * 100.0)
    } else {
        0.0
    };

    tracing::info!(
        "Budget {}: {} of {} measures selected, cost {}",
        budget,
        selected.len(),
        pool.len(),
        total_cost
    );

    GlobalOutcome::Optimal(GlobalSelection {
        measures_eliminated: pool.len() - selected.len(),
        selected_measures: selected,
        total_cost,
        total_efficacy,
        budget_used_percentage,
        budget_remaining: budget - total_cost,
    })
}
