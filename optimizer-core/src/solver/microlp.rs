//! In-process backend: pure-Rust MILP through `good_lp`'s microlp solver

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use super::model::{Domain, MipModel, Relation, Sense, SolveOutcome, TerminationCondition};
use super::SolverBackend;
use crate::error::SolverError;

#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpBackend;

impl MicrolpBackend {
    pub fn new() -> Self {
        Self
    }
}

fn linear_expression(handles: &[Variable], terms: &[(usize, f64)]) -> Expression {
    terms
        .iter()
        .map(|&(index, coefficient)| coefficient * handles[index])
        .sum::<Expression>()
}

impl SolverBackend for MicrolpBackend {
    fn name(&self) -> &str {
        "microlp"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, model: &MipModel) -> Result<SolveOutcome, SolverError> {
        model.validate()?;

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|v| match v.domain {
                Domain::Binary => vars.add(variable().binary()),
                Domain::NonNegative => vars.add(variable().min(0.0)),
            })
            .collect();

        let objective = linear_expression(&handles, model.objective());
        let unsolved = match model.sense() {
            Sense::Minimize => vars.minimise(objective),
            Sense::Maximize => vars.maximise(objective),
        };

        let mut problem = unsolved.using(microlp);
        for c in model.constraints() {
            let lhs = linear_expression(&handles, &c.terms);
            problem = problem.with(match c.relation {
                Relation::GreaterEq => constraint::geq(lhs, c.rhs),
                Relation::LessEq => constraint::leq(lhs, c.rhs),
            });
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|&h| solution.value(h)).collect();
                let objective_value = model.evaluate_objective(&values);
                Ok(SolveOutcome::solved(TerminationCondition::Optimal, objective_value, values))
            }
            Err(ResolutionError::Infeasible) => {
                Ok(SolveOutcome::without_solution(TerminationCondition::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                Ok(SolveOutcome::without_solution(TerminationCondition::Unbounded))
            }
            Err(other) => Err(SolverError::Backend {
                backend: self.name().to_string(),
                message: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_cost_knapsack_cover() {
        // min 100a + 200b + 50c  s.t.  40a + 50b + 45c >= 70
        let mut model = MipModel::new("cover", Sense::Minimize);
        let a = model.add_variable("a", Domain::Binary);
        let b = model.add_variable("b", Domain::Binary);
        let c = model.add_variable("c", Domain::Binary);
        for (i, cost) in [(a, 100.0), (b, 200.0), (c, 50.0)] {
            model.add_objective_term(i, cost);
        }
        model.add_constraint(
            "floor",
            vec![(a, 40.0), (b, 50.0), (c, 45.0)],
            Relation::GreaterEq,
            70.0,
        );

        let outcome = MicrolpBackend::new().solve(&model).unwrap();

        assert_eq!(outcome.termination, TerminationCondition::Optimal);
        let picked: Vec<bool> = outcome.values.iter().map(|v| *v > 0.5).collect();
        assert_eq!(picked, vec![true, false, true]);
        assert!((outcome.objective_value.unwrap() - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_reports_infeasible() {
        let mut model = MipModel::new("impossible", Sense::Minimize);
        let a = model.add_variable("a", Domain::Binary);
        model.add_objective_term(a, 1.0);
        model.add_constraint("floor", vec![(a, 10.0)], Relation::GreaterEq, 70.0);

        let outcome = MicrolpBackend::new().solve(&model).unwrap();

        assert_eq!(outcome.termination, TerminationCondition::Infeasible);
        assert!(outcome.values.is_empty());
    }
}
