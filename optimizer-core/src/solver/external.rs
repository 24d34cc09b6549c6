//! External solver executables (GLPK `glpsol`, COIN-OR `cbc`)
//!
//! The model is written in CPLEX LP format into a scratch directory, the
//! executable runs with its console output captured and discarded, and the
//! solution file it writes is parsed back.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::model::{Domain, MipModel, Sense, SolveOutcome, TerminationCondition};
use super::SolverBackend;
use crate::error::SolverError;

/// Output dialect of an external executable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Glpk,
    Cbc,
}

impl Dialect {
    pub fn default_program(&self) -> &'static str {
        match self {
            Dialect::Glpk => "glpsol",
            Dialect::Cbc => "cbc",
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Dialect::Glpk => "glpk",
            Dialect::Cbc => "cbc",
        }
    }

    /// Guess the dialect from an executable path (`/opt/coin/bin/cbc` -> Cbc)
    pub fn from_executable(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if stem.contains("cbc") {
            Dialect::Cbc
        } else {
            Dialect::Glpk
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExternalBackend {
    name: String,
    dialect: Dialect,
    program: PathBuf,
}

impl ExternalBackend {
    /// Backend looked up on `PATH` under its usual program name
    pub fn on_path(dialect: Dialect) -> Self {
        Self {
            name: dialect.backend_name().to_string(),
            dialect,
            program: PathBuf::from(dialect.default_program()),
        }
    }

    /// Backend bound to an explicit executable
    pub fn with_executable(dialect: Dialect, program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            name: format!("{}:{}", dialect.backend_name(), program.display()),
            dialect,
            program,
        }
    }

    fn resolved_program(&self) -> Option<PathBuf> {
        let raw = self.program.to_string_lossy();
        if path_contains_separator(&raw) {
            is_executable(&self.program).then(|| self.program.clone())
        } else {
            find_executable_in_path(&raw)
        }
    }

    fn run(&self, program: &Path, lp_path: &Path, out_path: &Path) -> Result<String, SolverError> {
        let mut cmd = Command::new(program);
        match self.dialect {
            Dialect::Glpk => {
                cmd.arg("--lp").arg(lp_path).arg("-o").arg(out_path);
            }
            Dialect::Cbc => {
                cmd.arg(lp_path).arg("solve").arg("solution").arg(out_path);
            }
        }
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() && !out_path.exists() {
            return Err(SolverError::Backend {
                backend: self.name.clone(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(stdout)
    }
}

impl SolverBackend for ExternalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.resolved_program().is_some()
    }

    fn solve(&self, model: &MipModel) -> Result<SolveOutcome, SolverError> {
        model.validate()?;
        let program = self.resolved_program().ok_or(SolverError::Unavailable)?;

        let scratch = tempfile::tempdir()?;
        let lp_path = scratch.path().join("model.lp");
        let out_path = scratch.path().join("solution.txt");
        std::fs::write(&lp_path, write_lp(model))?;

        let stdout = self.run(&program, &lp_path, &out_path)?;
        let report = std::fs::read_to_string(&out_path).unwrap_or_default();
        let count = model.variables().len();

        let outcome = match self.dialect {
            Dialect::Glpk => parse_glpk_report(&report, &stdout, count),
            Dialect::Cbc => parse_cbc_solution(&report, count),
        }
        .map_err(|message| SolverError::Parse {
            backend: self.name.clone(),
            message,
        })?;

        // Backends report the objective with their own rounding; recompute from values.
        if outcome.termination.has_solution() {
            let objective = model.evaluate_objective(&outcome.values);
            Ok(SolveOutcome::solved(outcome.termination, objective, outcome.values))
        } else {
            Ok(outcome)
        }
    }
}

// ============================================================================
// LP FILE WRITER
// ============================================================================

fn column(index: usize) -> String {
    format!("x{}", index)
}

fn write_terms(out: &mut String, terms: &[(usize, f64)]) {
    if terms.is_empty() {
        // LP format needs at least one term per row
        out.push_str(" 0 x0");
        return;
    }
    for (position, &(index, coefficient)) in terms.iter().enumerate() {
        let sign = if coefficient < 0.0 { "-" } else { "+" };
        if position == 0 && coefficient >= 0.0 {
            let _ = write!(out, " {} {}", coefficient, column(index));
        } else {
            let _ = write!(out, " {} {} {}", sign, coefficient.abs(), column(index));
        }
    }
}

/// Render a model in CPLEX LP format with columns named `x0..xn`
pub fn write_lp(model: &MipModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\\ {}", model.name());
    out.push_str(match model.sense() {
        Sense::Minimize => "Minimize\n",
        Sense::Maximize => "Maximize\n",
    });
    out.push_str(" obj:");
    write_terms(&mut out, model.objective());
    out.push('\n');

    out.push_str("Subject To\n");
    for (row, c) in model.constraints().iter().enumerate() {
        let _ = write!(out, " c{}:", row);
        write_terms(&mut out, &c.terms);
        let _ = writeln!(out, " {} {}", c.relation.symbol(), c.rhs);
    }

    out.push_str("Bounds\n");
    for (index, v) in model.variables().iter().enumerate() {
        match v.domain {
            Domain::Binary => {
                let _ = writeln!(out, " 0 <= {} <= 1", column(index));
            }
            Domain::NonNegative => {
                let _ = writeln!(out, " {} >= 0", column(index));
            }
        }
    }

    let binaries: Vec<String> = model
        .variables()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.domain == Domain::Binary)
        .map(|(index, _)| column(index))
        .collect();
    if !binaries.is_empty() {
        out.push_str("Binary\n");
        for name in binaries {
            let _ = writeln!(out, " {}", name);
        }
    }
    out.push_str("End\n");
    out
}

// ============================================================================
// OUTPUT PARSERS
// ============================================================================

fn column_index(name: &str) -> Option<usize> {
    name.strip_prefix('x')?.parse().ok()
}

fn glpk_status(status: &str) -> TerminationCondition {
    let upper = status.to_ascii_uppercase();
    if upper.contains("UNDEFINED") || upper.contains("EMPTY") || upper.contains("INFEASIBLE") {
        TerminationCondition::Infeasible
    } else if upper.contains("UNBOUNDED") {
        TerminationCondition::Unbounded
    } else if upper.contains("NON-OPTIMAL") || upper.contains("FEASIBLE") {
        TerminationCondition::Feasible
    } else if upper.contains("OPTIMAL") {
        TerminationCondition::Optimal
    } else {
        TerminationCondition::Other(status.trim().to_string())
    }
}

/// Parse the printable report written by `glpsol -o`
pub fn parse_glpk_report(report: &str, stdout: &str, count: usize) -> Result<SolveOutcome, String> {
    if report.trim().is_empty() {
        let upper = stdout.to_ascii_uppercase();
        if upper.contains("NO PRIMAL FEASIBLE SOLUTION") || upper.contains("NO INTEGER FEASIBLE SOLUTION") {
            return Ok(SolveOutcome::without_solution(TerminationCondition::Infeasible));
        }
        return Err("glpsol wrote no report".to_string());
    }

    let status = report
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("Status:"))
        .ok_or_else(|| "missing Status line".to_string())?;
    let termination = glpk_status(status);
    if !termination.has_solution() {
        return Ok(SolveOutcome::without_solution(termination));
    }

    let mut values = vec![0.0; count];
    let mut in_columns = false;
    let mut seen_rows = false;
    for line in report.lines() {
        if line.contains("Column name") {
            in_columns = true;
            continue;
        }
        if !in_columns || line.trim_start().starts_with("---") {
            continue;
        }
        if line.trim().is_empty() {
            if seen_rows {
                break;
            }
            continue;
        }
        seen_rows = true;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || tokens[0].parse::<usize>().is_err() {
            continue;
        }
        let Some(index) = column_index(tokens[1]) else { continue };
        // skip the integer marker (`*`) or basis status (B, NL, NU, ...)
        let activity = tokens[2..].iter().find_map(|t| t.parse::<f64>().ok());
        if let (Some(slot), Some(value)) = (values.get_mut(index), activity) {
            *slot = value;
        }
    }

    Ok(SolveOutcome::solved(termination, 0.0, values))
}

/// Parse the file written by `cbc ... solve solution <file>`
///
/// CBC only lists non-zero columns; missing ones are 0.
pub fn parse_cbc_solution(report: &str, count: usize) -> Result<SolveOutcome, String> {
    let mut lines = report.lines();
    let header = lines
        .next()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "empty cbc solution file".to_string())?;

    let lower = header.to_ascii_lowercase();
    let termination = if lower.starts_with("optimal") {
        TerminationCondition::Optimal
    } else if lower.contains("infeasible") {
        TerminationCondition::Infeasible
    } else if lower.contains("unbounded") {
        TerminationCondition::Unbounded
    } else if lower.starts_with("stopped") {
        TerminationCondition::Feasible
    } else {
        TerminationCondition::Other(header.to_string())
    };
    if !termination.has_solution() {
        return Ok(SolveOutcome::without_solution(termination));
    }

    let mut values = vec![0.0; count];
    for line in lines {
        let tokens: Vec<&str> = line
            .split_whitespace()
            .filter(|t| *t != "**")
            .collect();
        if tokens.len() < 3 {
            continue;
        }
        let Some(index) = column_index(tokens[1]) else { continue };
        let value = tokens[2]
            .parse::<f64>()
            .map_err(|_| format!("bad value in line {:?}", line.trim()))?;
        if let Some(slot) = values.get_mut(index) {
            *slot = value;
        }
    }

    Ok(SolveOutcome::solved(termination, 0.0, values))
}

// ============================================================================
// EXECUTABLE DISCOVERY
// ============================================================================

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && (m.permissions().mode() & 0o111 != 0))
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn path_contains_separator(cmd: &str) -> bool {
    cmd.contains(std::path::MAIN_SEPARATOR) || cmd.contains('/')
}

fn find_executable_in_path(name: &str) -> Option<PathBuf> {
    if name.trim().is_empty() {
        return None;
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| {
            let plain = dir.join(name);
            let exe = dir.join(format!("{}.exe", name));
            [plain, exe]
        })
        .find(|candidate| is_executable(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::Relation;

    fn cover_model() -> MipModel {
        let mut model = MipModel::new("attribute cover", Sense::Minimize);
        let a = model.add_variable("m1", Domain::Binary);
        let b = model.add_variable("m2", Domain::Binary);
        model.add_objective_term(a, 100.0);
        model.add_objective_term(b, 50.5);
        model.add_constraint("floor", vec![(a, 40.0), (b, 45.0)], Relation::GreaterEq, 70.0);
        model.add_constraint("budget", vec![(a, 100.0), (b, -1.0)], Relation::LessEq, 500.0);
        model
    }

    #[test]
    fn test_write_lp_layout() {
        let lp = write_lp(&cover_model());
        assert!(lp.starts_with("\\ attribute cover\nMinimize\n obj: 100 x0 + 50.5 x1\n"));
        assert!(lp.contains(" c0: 40 x0 + 45 x1 >= 70\n"));
        assert!(lp.contains(" c1: 100 x0 - 1 x1 <= 500\n"));
        assert!(lp.contains("Binary\n x0\n x1\nEnd\n"));
    }

    #[test]
    fn test_parse_glpk_mip_report() {
        let report = "\
Problem:
Rows:       1
Columns:    3 (3 integer, 3 binary)
Non-zeros:  3
Status:     INTEGER OPTIMAL
Objective:  obj = 150 (MINimum)

   No.   Row name        Activity     Lower bound   Upper bound
------ ------------    ------------- ------------- -------------
     1 c0                         85            70

   No. Column name       Activity     Lower bound   Upper bound
------ ------------    ------------- ------------- -------------
     1 x0           *              1             0             1
     2 x1           *              0             0             1
     3 x2           *              1             0             1

Integer feasibility conditions:
";
        let outcome = parse_glpk_report(report, "", 3).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Optimal);
        assert_eq!(outcome.values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parse_glpk_lp_report_with_basis_status() {
        let report = "\
Status:     OPTIMAL
Objective:  obj = 1 (MINimum)

   No. Column name  St   Activity     Lower bound   Upper bound    Marginal
------ ------------ -- ------------- ------------- ------------- -------------
     1 x0           B              1             0
     2 x1           NL             0             0                           1

Karush-Kuhn-Tucker optimality conditions:
";
        let outcome = parse_glpk_report(report, "", 2).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Optimal);
        assert_eq!(outcome.values, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_glpk_infeasible() {
        let report = "Status:     INTEGER EMPTY\nObjective:  obj = 0 (MINimum)\n";
        let outcome = parse_glpk_report(report, "", 2).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Infeasible);

        let outcome = parse_glpk_report("", "PROBLEM HAS NO PRIMAL FEASIBLE SOLUTION", 2).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Infeasible);
        assert!(parse_glpk_report("", "segfault", 2).is_err());
    }

    #[test]
    fn test_parse_cbc_solution_defaults_missing_columns_to_zero() {
        let report = "\
Optimal - objective value 150.00000000
      0 x0                           1                     100
      2 x2                           1                      50
";
        let outcome = parse_cbc_solution(report, 3).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Optimal);
        assert_eq!(outcome.values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_parse_cbc_infeasible() {
        let outcome = parse_cbc_solution("Infeasible - objective value 0.00000000\n", 2).unwrap();
        assert_eq!(outcome.termination, TerminationCondition::Infeasible);
        assert!(parse_cbc_solution("", 2).is_err());
    }

    #[test]
    fn test_dialect_from_executable() {
        assert_eq!(Dialect::from_executable(Path::new("/opt/coin/bin/cbc")), Dialect::Cbc);
        assert_eq!(Dialect::from_executable(Path::new("C:\\glpk\\glpsol.exe")), Dialect::Glpk);
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let backend = ExternalBackend::with_executable(Dialect::Cbc, "/nonexistent/dir/cbc");
        assert!(!backend.is_available());
        assert!(matches!(backend.solve(&cover_model()), Err(SolverError::Unavailable)));
    }
}
