//! Backend-neutral linear model
//!
//! Optimizers describe their problem with [`MipModel`]; each backend
//! translates it into its own representation.

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// 0/1 decision
    Binary,
    /// Continuous, >= 0
    NonNegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    GreaterEq,
    LessEq,
}

impl Relation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::GreaterEq => ">=",
            Relation::LessEq => "<=",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelVariable {
    pub label: String,
    pub domain: Domain,
}

/// `sum(coef * x[index]) relation rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub label: String,
    pub terms: Vec<(usize, f64)>,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub struct MipModel {
    name: String,
    sense: Sense,
    variables: Vec<ModelVariable>,
    objective: Vec<(usize, f64)>,
    constraints: Vec<LinearConstraint>,
}

impl MipModel {
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            sense,
            variables: Vec::new(),
            objective: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a variable and return its index
    pub fn add_variable(&mut self, label: impl Into<String>, domain: Domain) -> usize {
        self.variables.push(ModelVariable { label: label.into(), domain });
        self.variables.len() - 1
    }

    pub fn add_objective_term(&mut self, index: usize, coefficient: f64) {
        self.objective.push((index, coefficient));
    }

    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(usize, f64)>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            label: label.into(),
            terms,
            relation,
            rhs,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn variables(&self) -> &[ModelVariable] {
        &self.variables
    }

    pub fn objective(&self) -> &[(usize, f64)] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective value for a given assignment
    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|&(i, c)| c * values.get(i).copied().unwrap_or(0.0))
            .sum()
    }

    /// Reject non-finite coefficients and dangling indices before any backend sees the model
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.variables.is_empty() {
            return Err(SolverError::MalformedModel(format!("{}: model has no variables", self.name)));
        }

        let check_terms = |owner: &str, terms: &[(usize, f64)]| -> Result<(), SolverError> {
            for &(index, coefficient) in terms {
                if index >= self.variables.len() {
                    return Err(SolverError::MalformedModel(format!(
                        "{}: {} references unknown variable #{}",
                        self.name, owner, index
                    )));
                }
                if !coefficient.is_finite() {
                    return Err(SolverError::MalformedModel(format!(
                        "{}: {} has non-finite coefficient for {}",
                        self.name, owner, self.variables[index].label
                    )));
                }
            }
            Ok(())
        };

        check_terms("objective", &self.objective)?;
        for constraint in &self.constraints {
            check_terms(&constraint.label, &constraint.terms)?;
            if !constraint.rhs.is_finite() {
                return Err(SolverError::MalformedModel(format!(
                    "{}: {} has non-finite right-hand side",
                    self.name, constraint.label
                )));
            }
        }
        Ok(())
    }
}

/// Solver verdict on a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCondition {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    Other(String),
}

impl TerminationCondition {
    pub fn is_optimal(&self) -> bool {
        matches!(self, TerminationCondition::Optimal)
    }

    pub fn has_solution(&self) -> bool {
        matches!(self, TerminationCondition::Optimal | TerminationCondition::Feasible)
    }
}

impl std::fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationCondition::Optimal => write!(f, "optimal"),
            TerminationCondition::Feasible => write!(f, "feasible"),
            TerminationCondition::Infeasible => write!(f, "infeasible"),
            TerminationCondition::Unbounded => write!(f, "unbounded"),
            TerminationCondition::Other(detail) => write!(f, "{}", detail),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub termination: TerminationCondition,
    pub objective_value: Option<f64>,
    /// One value per model variable, empty when there is no solution
    pub values: Vec<f64>,
}

impl SolveOutcome {
    pub fn solved(termination: TerminationCondition, objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            termination,
            objective_value: Some(objective_value),
            values,
        }
    }

    pub fn without_solution(termination: TerminationCondition) -> Self {
        Self {
            termination,
            objective_value: None,
            values: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_nan_coefficient() {
        let mut model = MipModel::new("bad", Sense::Minimize);
        let x = model.add_variable("x", Domain::Binary);
        model.add_objective_term(x, f64::NAN);
        assert!(matches!(model.validate(), Err(SolverError::MalformedModel(_))));
    }

    #[test]
    fn test_validate_rejects_dangling_index() {
        let mut model = MipModel::new("bad", Sense::Minimize);
        model.add_variable("x", Domain::Binary);
        model.add_constraint("c", vec![(3, 1.0)], Relation::GreaterEq, 1.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        assert!(MipModel::new("empty", Sense::Maximize).validate().is_err());
    }

    #[test]
    fn test_evaluate_objective() {
        let mut model = MipModel::new("m", Sense::Minimize);
        let a = model.add_variable("a", Domain::Binary);
        let b = model.add_variable("b", Domain::Binary);
        model.add_objective_term(a, 100.0);
        model.add_objective_term(b, 50.0);
        assert_eq!(model.evaluate_objective(&[1.0, 1.0]), 150.0);
        assert_eq!(model.evaluate_objective(&[0.0, 1.0]), 50.0);
    }
}
