//! Central Configuration Constants
//!
//! Single source of truth for optimizer defaults.
//! Every value can be overridden through the environment.

use std::path::PathBuf;

use crate::solver::SolverKind;

/// Minimum aggregate efficacy (0-100 scale) the min-cost formulation must reach
pub const DEFAULT_EFFICACY_FLOOR: f64 = 70.0;

/// Decision variables above this value count as selected
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// Backends tried in order when nothing else is configured
pub const DEFAULT_SOLVER_PREFERENCE: [SolverKind; 3] =
    [SolverKind::Glpk, SolverKind::Cbc, SolverKind::Microlp];

/// Comment stored on every implementation record created by the planner
pub const PLAN_COMMENT: &str = "Recommended by automatic optimization";

/// Shown when no backend passes the startup probe
pub const SOLVER_INSTALL_HELP: &str =
    "Install a MILP solver (e.g. `apt install glpk-utils` or `coinor-cbc`) or enable the `microlp` backend";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Ordered solver preference, e.g. `SOLVER_PREFERENCE=cbc,microlp`
///
/// Unknown names are ignored. An empty or fully unknown list falls back to
/// the default order.
pub fn get_solver_preference() -> Vec<SolverKind> {
    std::env::var("SOLVER_PREFERENCE")
        .ok()
        .map(|raw| parse_solver_preference(&raw))
        .filter(|kinds| !kinds.is_empty())
        .unwrap_or_else(|| DEFAULT_SOLVER_PREFERENCE.to_vec())
}

/// Explicit solver executable, tried before the preference list
pub fn get_solver_executable() -> Option<PathBuf> {
    std::env::var("SOLVER_EXECUTABLE")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Efficacy floor from environment or default
pub fn get_efficacy_floor() -> f64 {
    std::env::var("EFFICACY_FLOOR")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(DEFAULT_EFFICACY_FLOOR)
}

pub(crate) fn parse_solver_preference(raw: &str) -> Vec<SolverKind> {
    let mut kinds = Vec::new();
    for name in raw.split(',') {
        match name.trim().parse::<SolverKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(_) => tracing::warn!("Ignoring unknown solver name in preference: {:?}", name.trim()),
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preference_keeps_order_and_drops_unknown() {
        let kinds = parse_solver_preference("cbc, bonmin ,microlp,cbc");
        assert_eq!(kinds, vec![SolverKind::Cbc, SolverKind::Microlp]);
    }

    #[test]
    fn test_parse_preference_empty() {
        assert!(parse_solver_preference("").is_empty());
        assert!(parse_solver_preference("gurobi").is_empty());
    }
}
