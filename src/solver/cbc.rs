//! External CBC backend.
//!
//! The problem is written as an LP file, handed to the `cbc` executable, and
//! the solution file it writes is read back. Solution file layout:
//!
//! ```text
//! Optimal - objective value 12.00000000
//!       3 x_0_3          1       1
//!      10 x_1_2          1       1
//! ```
//!
//! The first line carries the status and objective; each following line is
//! `index name value reduced-cost`, optionally prefixed by `**` when the row
//! is flagged. Variables absent from the file are zero.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::FxHashMap;

use crate::error::SolverUnavailable;
use crate::model::Problem;
use crate::solver::{Assignment, IlpSolver, SolverOutcome, SolverStatus};

/// Distinguishes temp files of concurrent solves in one process.
static SOLVE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Runs the COIN-OR CBC executable.
#[derive(Debug, Clone)]
pub struct CbcCommand {
    executable: PathBuf,
    time_limit: Option<u64>,
}

impl Default for CbcCommand {
    fn default() -> Self {
        Self::new("cbc")
    }
}

impl CbcCommand {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            time_limit: None,
        }
    }

    /// Time limit in seconds, forwarded as CBC's `sec` option.
    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    fn io_error(&self, source: std::io::Error) -> SolverUnavailable {
        SolverUnavailable::Io {
            name: self.executable.display().to_string(),
            source,
        }
    }

    fn run(&self, lp_path: &Path, solution_path: &Path) -> Result<bool, SolverUnavailable> {
        let mut command = Command::new(&self.executable);
        command.arg(lp_path);
        if let Some(seconds) = self.time_limit {
            command.arg("sec").arg(seconds.to_string());
        }
        command
            .arg("solve")
            .arg("solu")
            .arg(solution_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match command.status() {
            Ok(status) => Ok(status.success()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SolverUnavailable::NotFound(
                self.executable.display().to_string(),
            )),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

impl IlpSolver for CbcCommand {
    fn name(&self) -> &str {
        "cbc"
    }

    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverUnavailable> {
        let stem = format!(
            "knights-{}-{}",
            std::process::id(),
            SOLVE_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let dir = std::env::temp_dir();
        let lp_path = dir.join(format!("{stem}.lp"));
        let solution_path = dir.join(format!("{stem}.sol"));

        fs::write(&lp_path, problem.to_lp()).map_err(|e| self.io_error(e))?;
        let ran = self.run(&lp_path, &solution_path);
        let solution = fs::read_to_string(&solution_path);
        let _ = fs::remove_file(&lp_path);
        let _ = fs::remove_file(&solution_path);

        let exited_cleanly = ran?;
        match solution {
            Ok(text) => parse_solution(problem, &text),
            Err(_) if !exited_cleanly => Ok(SolverOutcome::without_solution(SolverStatus::SolverError)),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Maps the first word of CBC's status line.
fn parse_status(word: &str) -> SolverStatus {
    match word {
        "Optimal" => SolverStatus::Optimal,
        "Infeasible" | "Integer" => SolverStatus::Infeasible,
        "Unbounded" => SolverStatus::Unbounded,
        "Stopped" => SolverStatus::NotSolved,
        _ => SolverStatus::SolverError,
    }
}

/// Reads a CBC solution file for `problem`.
fn parse_solution(problem: &Problem, text: &str) -> Result<SolverOutcome, SolverUnavailable> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| SolverUnavailable::Output("empty solution file".to_string()))?;
    let status = parse_status(header.split_whitespace().next().unwrap_or_default());
    if status != SolverStatus::Optimal {
        return Ok(SolverOutcome::without_solution(status));
    }

    let index: FxHashMap<&str, usize> = problem
        .var_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut values = vec![0.0; problem.num_vars()];
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let mut fields = line.split_whitespace().skip_while(|&field| field == "**");
        let (Some(_), Some(name), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(SolverUnavailable::Output(format!("malformed line `{line}`")));
        };
        // rows and unknown columns are not part of the assignment
        let Some(&var) = index.get(name) else {
            continue;
        };
        values[var] = value
            .parse()
            .map_err(|_| SolverUnavailable::Output(format!("bad value `{value}` for {name}")))?;
    }

    let objective = header
        .rsplit_once("objective value")
        .and_then(|(_, rest)| rest.trim().parse::<f64>().ok())
        .unwrap_or_else(|| problem.objective.evaluate(&values));

    Ok(SolverOutcome {
        status,
        assignment: Some(Assignment { values, objective }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KnightModel;

    #[test]
    fn test_parse_optimal_solution() {
        let model = KnightModel::build(2).unwrap();
        let text = "Optimal - objective value 4.00000000\n\
                    \x20     0 x_0_0   1   1\n\
                    \x20     1 x_0_1   1   1\n\
                    \x20     2 x_1_0   1   1\n\
                    \x20     3 x_1_1   1   1\n";
        let outcome = parse_solution(model.problem(), text).unwrap();
        assert_eq!(outcome, SolverOutcome::optimal(vec![1.0; 4], 4.0));
    }

    #[test]
    fn test_missing_variables_are_zero() {
        let model = KnightModel::build(3).unwrap();
        let text = "Optimal - objective value 1\n\
                    ** 4 x_1_1 1 1\n";
        let outcome = parse_solution(model.problem(), text).unwrap();
        let assignment = outcome.assignment.unwrap();
        assert_eq!(assignment.objective, 1.0);
        assert_eq!(assignment.values[4], 1.0);
        assert_eq!(assignment.values.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_objective_falls_back_to_values() {
        let model = KnightModel::build(1).unwrap();
        let outcome = parse_solution(model.problem(), "Optimal\n0 x_0_0 1 0\n").unwrap();
        assert_eq!(outcome.assignment.unwrap().objective, 1.0);
    }

    #[test]
    fn test_non_optimal_statuses() {
        let model = KnightModel::build(1).unwrap();
        let cases = [
            ("Infeasible - objective value 0", SolverStatus::Infeasible),
            ("Integer infeasible - objective value 0", SolverStatus::Infeasible),
            ("Unbounded - objective value 0", SolverStatus::Unbounded),
            ("Stopped on time - objective value 13", SolverStatus::NotSolved),
            ("Something odd", SolverStatus::SolverError),
        ];
        for (header, expected) in cases {
            let outcome = parse_solution(model.problem(), header).unwrap();
            assert_eq!(outcome, SolverOutcome::without_solution(expected), "{header}");
        }
    }

    #[test]
    fn test_malformed_files() {
        let model = KnightModel::build(1).unwrap();
        assert!(parse_solution(model.problem(), "").is_err());
        assert!(parse_solution(model.problem(), "Optimal\n0 x_0_0\n").is_err());
        assert!(parse_solution(model.problem(), "Optimal\n0 x_0_0 one 0\n").is_err());
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let model = KnightModel::build(1).unwrap();
        let solver = CbcCommand::new("/nonexistent/knights-test/cbc");
        let err = solver.solve(model.problem()).unwrap_err();
        assert!(matches!(err, SolverUnavailable::NotFound(_)), "{err:?}");
    }
}
