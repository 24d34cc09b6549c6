//! Implementation plan generator
//!
//! Turns the selections of a run into `planned` implementation records, one
//! per (attribute-threat link, measure). The batch is written atomically.

use uuid::Uuid;

use super::types::{ArchitectureOptimization, ImplementationPlan, OptimizationResult};
use super::SecurityOptimizer;
use crate::constants::PLAN_COMMENT;
use crate::error::OptimizerResult;
use crate::models::NewImplementation;

impl SecurityOptimizer {
    pub async fn create_implementation_plan(
        &self,
        run: &ArchitectureOptimization,
        owner_id: Option<Uuid>,
    ) -> OptimizerResult<ImplementationPlan> {
        let results: Vec<&OptimizationResult> = run.attributes.iter().map(|r| &r.result).collect();
        self.plan_for_results(&results, owner_id).await
    }

    /// Plan from any set of per-attribute results; non-optimal ones contribute nothing
    pub async fn plan_for_results(
        &self,
        results: &[&OptimizationResult],
        owner_id: Option<Uuid>,
    ) -> OptimizerResult<ImplementationPlan> {
        let mut plan = ImplementationPlan::default();
        let mut drafts = Vec::new();

        for result in results {
            for measure in result.selected_measures() {
                let link = self
                    .store
                    .get_attribute_threat_link(result.attribute_id, measure.threat_id)
                    .await?;
                match link {
                    Some(link) => drafts.push(
                        NewImplementation::planned(link.id, measure.measure_id, owner_id)
                            .with_comment(PLAN_COMMENT),
                    ),
                    None => {
                        tracing::warn!(
                            "No link between attribute {} and threat {}; skipping measure {}",
                            result.attribute_id,
                            measure.threat_id,
                            measure.name
                        );
                        plan.skipped_missing_link += 1;
                    }
                }
            }
        }

        if drafts.is_empty() {
            return Ok(plan);
        }

        let records = match self.store.create_implementation_records(&drafts).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Implementation plan rolled back: {}", e);
                return Err(e.into());
            }
        };

        plan.skipped_existing = drafts.len() - records.len();
        plan.implementations_created = records.len();
        plan.implementation_ids = records.into_iter().map(|r| r.id).collect();

        tracing::info!(
            "Implementation plan: {} created, {} already present, {} without link",
            plan.implementations_created,
            plan.skipped_existing,
            plan.skipped_missing_link
        );
        Ok(plan)
    }
}
