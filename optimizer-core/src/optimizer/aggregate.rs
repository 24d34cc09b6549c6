//! Architecture-level aggregation
//!
//! Runs every attribute of every asset, pools the selected measures
//! (deduplicated by id, first selection wins) and optionally hands the pool to
//! the budget selection.

use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use super::budget::validate_budget;
use super::types::{
    round2, ArchitectureOptimization, ArchitectureRequest, AttributeRun, CandidateMeasure,
    GlobalOptimization, Recommendation, Summary,
};
use super::SecurityOptimizer;
use crate::error::{OptimizerError, OptimizerResult};
use crate::models::{Architecture, Asset, SecurityAttribute};

impl SecurityOptimizer {
    pub async fn optimize_architecture(
        &self,
        architecture_id: Uuid,
        request: &ArchitectureRequest,
    ) -> OptimizerResult<ArchitectureOptimization> {
        if !self.solver.is_available() {
            return Err(OptimizerError::SolverUnavailable);
        }
        if let Some(budget) = request.budget {
            validate_budget(budget)?;
        }

        let architecture = self
            .store
            .get_architecture(architecture_id)
            .await?
            .ok_or(OptimizerError::ArchitectureNotFound(architecture_id))?;
        let assets = self.store.list_assets(architecture_id).await?;

        tracing::info!(
            "Optimizing architecture {} ({} assets, {})",
            architecture.name,
            assets.len(),
            request.formulation.as_str()
        );

        let mut runs = Vec::new();
        let mut pool = MeasurePool::default();
        for asset in &assets {
            let attributes = self.store.list_attributes(asset.id).await?;
            for attribute in &attributes {
                let result = self.optimize_attribute(attribute, request.formulation).await;
                tracing::debug!(
                    "{} / {}: {}",
                    asset.name,
                    attribute.kind,
                    result.status()
                );
                pool.extend(result.selected_measures());
                runs.push(attribute_run(asset, attribute, result));
            }
        }

        let global = match request.budget {
            Some(budget) => Some(self.optimize_budget(pool.measures(), budget).await?),
            None => None,
        };

        let summary = summarize(&architecture, &runs, pool.measures(), global.as_ref());
        let successful = runs.iter().filter(|r| r.result.is_optimal()).count();

        tracing::info!(
            "Architecture {} optimized: {}/{} attributes successful, {} distinct measures",
            architecture.name,
            successful,
            runs.len(),
            summary.total_measures
        );

        Ok(ArchitectureOptimization {
            architecture_id,
            architecture_name: architecture.name,
            formulation: request.formulation,
            solver_used: self.solver.backend_name().map(str::to_string),
            total_assets_processed: assets.len(),
            total_attributes_processed: runs.len(),
            successful_optimizations: successful,
            total_measures_rejected: runs.iter().map(|r| r.result.measures_rejected).sum(),
            recommended_measures: pool.into_measures(),
            attributes: runs,
            summary,
            global_optimization: global,
        })
    }
}

/// Selected measures in first-selection order, one entry per id
#[derive(Debug, Default)]
pub struct MeasurePool {
    seen: HashSet<Uuid>,
    measures: Vec<CandidateMeasure>,
}

impl MeasurePool {
    pub fn extend(&mut self, selected: &[CandidateMeasure]) {
        for measure in selected {
            if self.seen.insert(measure.measure_id) {
                self.measures.push(measure.clone());
            }
        }
    }

    pub fn measures(&self) -> &[CandidateMeasure] {
        &self.measures
    }

    pub fn into_measures(self) -> Vec<CandidateMeasure> {
        self.measures
    }
}

fn attribute_run(
    asset: &Asset,
    attribute: &SecurityAttribute,
    result: super::types::OptimizationResult,
) -> AttributeRun {
    AttributeRun {
        asset_id: asset.id,
        asset_name: asset.name.clone(),
        asset_criticality: asset.criticality,
        attribute_kind: attribute.kind,
        attribute_priority: attribute.priority,
        compromise_cost: attribute.compromise_cost,
        result,
    }
}

pub(crate) fn summarize(
    architecture: &Architecture,
    runs: &[AttributeRun],
    pool: &[CandidateMeasure],
    global: Option<&GlobalOptimization>,
) -> Summary {
    let mut measures_by_nature: BTreeMap<String, usize> = BTreeMap::new();
    for measure in pool {
        *measures_by_nature.entry(measure.nature.clone()).or_default() += 1;
    }

    let recommendations = runs
        .iter()
        .filter_map(|run| {
            let selection = run.result.outcome.selection()?;
            Some(Recommendation {
                asset_name: run.asset_name.clone(),
                attribute_kind: run.attribute_kind,
                measures_count: selection.selected_measures.len(),
                cost: selection.total_cost,
                risk_reduction: selection.estimated_risk_reduction,
            })
        })
        .collect();

    let total_exposure: f64 = runs.iter().map(|r| r.result.exposure).sum();
    let global_selection = global.and_then(|g| g.outcome.selection());
    let total_cost: f64 = runs.iter().map(|r| r.result.total_cost()).sum();

    Summary {
        total_measures: pool.len(),
        total_cost,
        measures_by_nature,
        recommendations,
        total_exposure: round2(total_exposure),
        risk_tolerance: architecture.risk_tolerance,
        exceeds_risk_tolerance: total_exposure > architecture.risk_tolerance,
        total_cost_with_budget: global_selection.map(|s| s.total_cost),
        budget_savings: global_selection.map(|s| total_cost - s.total_cost),
        measures_selected_with_budget: global_selection.map(|s| s.selected_measures.len()),
    }
}
