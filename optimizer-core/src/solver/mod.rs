//! Solver Backend Adapter
//!
//! Probes an ordered list of backends once, keeps the first one that really
//! solves a model, and exposes a uniform `solve(model)`.
//!
//! ```text
//! SolverConfig ──► candidates ──► is_available? ──► probe model ──► active backend
//!                                     │ no              │ fail
//!                                     └──── next ◄──────┘
//! ```

pub mod external;
pub mod microlp;
pub mod model;

pub use external::{Dialect, ExternalBackend};
pub use microlp::MicrolpBackend;
pub use model::{
    Domain, LinearConstraint, MipModel, ModelVariable, Relation, Sense, SolveOutcome,
    TerminationCondition,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants;
use crate::error::SolverError;

// ============================================================================
// BACKEND TRAIT
// ============================================================================

pub trait SolverBackend: Send + Sync + std::fmt::Debug {
    /// Identifier kept for diagnostics
    fn name(&self) -> &str;

    /// Declared availability (executable present, library linked, ...)
    fn is_available(&self) -> bool;

    /// Solve without retrying; retry policy belongs to the caller
    fn solve(&self, model: &MipModel) -> Result<SolveOutcome, SolverError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Glpk,
    Cbc,
    Microlp,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Glpk => "glpk",
            SolverKind::Cbc => "cbc",
            SolverKind::Microlp => "microlp",
        }
    }

    pub fn backend(&self) -> Box<dyn SolverBackend> {
        match self {
            SolverKind::Glpk => Box::new(ExternalBackend::on_path(Dialect::Glpk)),
            SolverKind::Cbc => Box::new(ExternalBackend::on_path(Dialect::Cbc)),
            SolverKind::Microlp => Box::new(MicrolpBackend::new()),
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "glpk" | "glpsol" => Ok(SolverKind::Glpk),
            "cbc" => Ok(SolverKind::Cbc),
            "microlp" => Ok(SolverKind::Microlp),
            other => Err(format!("unknown solver {:?}", other)),
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Backends tried in order
    pub preference: Vec<SolverKind>,
    /// Explicit executable, tried before the preference list
    pub executable: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            preference: constants::DEFAULT_SOLVER_PREFERENCE.to_vec(),
            executable: None,
        }
    }
}

impl SolverConfig {
    pub fn from_env() -> Self {
        Self {
            preference: constants::get_solver_preference(),
            executable: constants::get_solver_executable(),
        }
    }

    /// Only the in-process backend; handy for tests and embedded use
    pub fn in_process() -> Self {
        Self {
            preference: vec![SolverKind::Microlp],
            executable: None,
        }
    }

    pub fn candidates(&self) -> Vec<Box<dyn SolverBackend>> {
        let mut candidates: Vec<Box<dyn SolverBackend>> = Vec::new();
        if let Some(path) = &self.executable {
            let dialect = Dialect::from_executable(path);
            candidates.push(Box::new(ExternalBackend::with_executable(dialect, path.clone())));
        }
        candidates.extend(self.preference.iter().map(SolverKind::backend));
        candidates
    }
}

// ============================================================================
// ADAPTER
// ============================================================================

/// What happened to one candidate during startup probing
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub backend: String,
    pub available: bool,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Diagnostics snapshot of the adapter
#[derive(Debug, Clone, Serialize)]
pub struct SolverStatus {
    pub available: bool,
    pub active_backend: Option<String>,
    pub probes: Vec<ProbeReport>,
    pub help: Option<&'static str>,
}

#[derive(Debug)]
pub struct SolverAdapter {
    active: Option<Box<dyn SolverBackend>>,
    probes: Vec<ProbeReport>,
}

impl SolverAdapter {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self::probe(config.candidates())
    }

    /// Keep the first candidate that is available and solves the probe model
    pub fn probe(candidates: Vec<Box<dyn SolverBackend>>) -> Self {
        let mut probes = Vec::with_capacity(candidates.len());
        let mut active = None;

        for backend in candidates {
            let name = backend.name().to_string();
            if !backend.is_available() {
                tracing::debug!("Solver {} not available", name);
                probes.push(ProbeReport { backend: name, available: false, passed: false, detail: None });
                continue;
            }

            match probe_backend(backend.as_ref()) {
                Ok(()) => {
                    tracing::info!("Solver {} initialised and tested successfully", name);
                    probes.push(ProbeReport { backend: name, available: true, passed: true, detail: None });
                    active = Some(backend);
                    break;
                }
                Err(detail) => {
                    tracing::debug!("Solver {} failed its probe: {}", name, detail);
                    probes.push(ProbeReport {
                        backend: name,
                        available: true,
                        passed: false,
                        detail: Some(detail),
                    });
                }
            }
        }

        if active.is_none() {
            tracing::warn!(
                "No optimization solver available; optimization features are disabled. {}",
                constants::SOLVER_INSTALL_HELP
            );
        }

        Self { active, probes }
    }

    /// Adapter with no backend at all
    pub fn unavailable() -> Self {
        Self::probe(Vec::new())
    }

    pub fn is_available(&self) -> bool {
        self.active.is_some()
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.active.as_deref().map(|b| b.name())
    }

    pub fn status(&self) -> SolverStatus {
        SolverStatus {
            available: self.is_available(),
            active_backend: self.backend_name().map(str::to_string),
            probes: self.probes.clone(),
            help: (!self.is_available()).then_some(constants::SOLVER_INSTALL_HELP),
        }
    }

    pub fn solve(&self, model: &MipModel) -> Result<SolveOutcome, SolverError> {
        let backend = self.active.as_deref().ok_or(SolverError::Unavailable)?;
        model.validate()?;
        tracing::debug!(
            "Solving {} ({} variables, {} constraints) with {}",
            model.name(),
            model.variables().len(),
            model.constraints().len(),
            backend.name()
        );
        backend.solve(model)
    }
}

/// `min x1 + x2  s.t.  x1 + x2 >= 1`, both continuous and non-negative
fn probe_model() -> MipModel {
    let mut model = MipModel::new("probe", Sense::Minimize);
    let x1 = model.add_variable("x1", Domain::NonNegative);
    let x2 = model.add_variable("x2", Domain::NonNegative);
    model.add_objective_term(x1, 1.0);
    model.add_objective_term(x2, 1.0);
    model.add_constraint("cover", vec![(x1, 1.0), (x2, 1.0)], Relation::GreaterEq, 1.0);
    model
}

fn probe_backend(backend: &dyn SolverBackend) -> Result<(), String> {
    let outcome = backend.solve(&probe_model()).map_err(|e| e.to_string())?;
    if !outcome.termination.has_solution() {
        return Err(format!("probe terminated with {}", outcome.termination));
    }
    if outcome.values.len() != 2 || outcome.values.iter().any(|v| !v.is_finite()) {
        return Err("probe returned no usable values".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StubBackend {
        name: &'static str,
        available: bool,
        termination: TerminationCondition,
    }

    impl SolverBackend for StubBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn solve(&self, model: &MipModel) -> Result<SolveOutcome, SolverError> {
            if self.termination.has_solution() {
                let values = vec![0.5; model.variables().len()];
                Ok(SolveOutcome::solved(self.termination.clone(), 1.0, values))
            } else {
                Ok(SolveOutcome::without_solution(self.termination.clone()))
            }
        }
    }

    fn stub(name: &'static str, available: bool, termination: TerminationCondition) -> Box<dyn SolverBackend> {
        Box::new(StubBackend { name, available, termination })
    }

    #[test]
    fn test_first_passing_backend_wins() {
        let adapter = SolverAdapter::probe(vec![
            stub("missing", false, TerminationCondition::Optimal),
            stub("broken", true, TerminationCondition::Other("error".into())),
            stub("good", true, TerminationCondition::Optimal),
            stub("later", true, TerminationCondition::Optimal),
        ]);

        assert!(adapter.is_available());
        assert_eq!(adapter.backend_name(), Some("good"));

        let status = adapter.status();
        assert_eq!(status.probes.len(), 3);
        assert!(!status.probes[0].available);
        assert!(status.probes[1].available && !status.probes[1].passed);
        assert!(status.probes[2].passed);
        assert!(status.help.is_none());
    }

    #[test]
    fn test_empty_candidate_list_is_unavailable() {
        let adapter = SolverAdapter::unavailable();
        assert!(!adapter.is_available());
        assert!(adapter.status().help.is_some());
        assert!(matches!(adapter.solve(&probe_model()), Err(SolverError::Unavailable)));
    }

    #[test]
    fn test_falls_through_missing_executables_to_microlp() {
        let config = SolverConfig {
            preference: vec![SolverKind::Microlp],
            executable: Some(PathBuf::from("/nonexistent/solver/glpsol")),
        };
        let adapter = SolverAdapter::from_config(&config);
        assert_eq!(adapter.backend_name(), Some("microlp"));
    }

    #[test]
    fn test_probe_model_solves_with_microlp() {
        assert!(probe_backend(&MicrolpBackend::new()).is_ok());
    }

    #[test]
    fn test_solver_kind_parse() {
        assert_eq!("GLPSOL".parse::<SolverKind>().unwrap(), SolverKind::Glpk);
        assert!("bonmin".parse::<SolverKind>().is_err());
    }
}
