//! Security control optimizer
//!
//! ```text
//! attribute ──► candidates ──► MIP (floor | coverage) ──► OptimizationResult
//!     ▲                                                        │
//! architecture ── every asset/attribute ── pool (dedup) ◄──────┘
//!                                            │
//!                                  budget MIP (optional) ──► GlobalOptimization
//!                                            │
//!                                   implementation plan ──► store
//! ```
//!
//! The optimizer owns no global state: its store and solver adapter are
//! injected at construction and shared through `Arc`.

mod aggregate;
mod attribute;
mod budget;
mod candidates;
mod plan;
pub mod types;


pub use aggregate::MeasurePool;
pub use attribute::build_attribute_model;
pub use budget::{build_budget_model, validate_budget};
pub use candidates::build_candidate_set;
pub use types::*;

use std::sync::Arc;

use crate::constants;
use crate::error::SolverError;
use crate::solver::{MipModel, SolveOutcome, SolverAdapter, SolverStatus};
use crate::store::SecurityStore;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Efficacy floor used by `Formulation::EfficacyFloor`
    pub efficacy_floor: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            efficacy_floor: constants::DEFAULT_EFFICACY_FLOOR,
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Self {
        Self {
            efficacy_floor: constants::get_efficacy_floor(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityOptimizer {
    store: Arc<dyn SecurityStore>,
    solver: Arc<SolverAdapter>,
    config: OptimizerConfig,
}

impl SecurityOptimizer {
    pub fn new(store: Arc<dyn SecurityStore>, solver: Arc<SolverAdapter>, config: OptimizerConfig) -> Self {
        Self { store, solver, config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn solver_status(&self) -> SolverStatus {
        self.solver.status()
    }

    /// Solve on the blocking pool; external backends wait on a child process
    async fn solve_model(&self, model: MipModel) -> Result<SolveOutcome, SolverError> {
        let solver = Arc::clone(&self.solver);
        tokio::task::spawn_blocking(move || solver.solve(&model))
            .await
            .map_err(|e| SolverError::Backend {
                backend: self.solver.backend_name().unwrap_or("solver").to_string(),
                message: e.to_string(),
            })?
    }
}
