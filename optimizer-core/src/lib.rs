//! Security Control Selection Optimizer - Core Library
//!
//! Chooses which control measures to deploy against the threats of an
//! architecture's security attributes, using mixed-integer programming.
//!
//! - `solver`    backend adapter (glpk / cbc executables, in-process microlp)
//! - `optimizer` candidate sets, per-attribute and budget models, plans
//! - `store`     persistence boundary consumed by the optimizer
//! - `models`    domain entities

pub mod constants;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod solver;
pub mod store;

pub use error::{OptimizerError, OptimizerResult, SolverError, StoreError};
pub use optimizer::{
    ArchitectureOptimization, ArchitectureRequest, Formulation, ImplementationPlan,
    OptimizationResult, OptimizerConfig, SecurityOptimizer,
};
pub use solver::{SolverAdapter, SolverConfig, SolverStatus};
pub use store::{MemoryStore, SecurityStore};
