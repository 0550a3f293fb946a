//! In-process branch-and-bound for covering programs.
//!
//! Accepts programs where every row is `sum(x) >= 1` over unit coefficients
//! and the objective has non-negative costs: the weighted set cover shape the
//! knight model produces.
//!
//! Search:
//! - Branch on the uncovered row with the fewest allowed variables.
//! - In the i-th child the row's first i-1 variables are forbidden, so no
//!   selection is explored twice.
//! - Bound: each uncovered row costs at least the cheapest
//!   `cost / newly_covered_rows` among its allowed variables.
//! - A greedy cover seeds the incumbent.

use crate::error::SolverUnavailable;
use crate::model::{Problem, Sense};
use crate::solver::{IlpSolver, SolverOutcome, SolverStatus};

/// Slack for floating point comparisons on costs and coefficients.
const EPSILON: f64 = 1e-9;

/// Exact solver for covering-form binary programs.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    node_limit: Option<u64>,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops with [`SolverStatus::NotSolved`] after exploring this many nodes.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl IlpSolver for BranchAndBound {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &Problem) -> Result<SolverOutcome, SolverUnavailable> {
        let cover = match CoverProblem::from_problem(problem) {
            Ok(cover) => cover,
            Err(status) => return Ok(SolverOutcome::without_solution(status)),
        };

        let mut search = Search::new(&cover, self.node_limit);
        if search.explore(0.0).is_err() {
            return Ok(SolverOutcome::without_solution(SolverStatus::NotSolved));
        }

        let Some(selected) = search.best else {
            return Ok(SolverOutcome::without_solution(SolverStatus::Infeasible));
        };
        let mut values = vec![0.0; problem.num_vars()];
        for var in selected {
            values[var] = 1.0;
        }
        let objective = problem.objective.evaluate(&values);
        Ok(SolverOutcome::optimal(values, objective))
    }
}

/// A program reduced to rows of variable indices plus per-variable costs.
struct CoverProblem {
    costs: Vec<f64>,
    /// Variables that satisfy each row.
    rows: Vec<Vec<usize>>,
    /// Rows satisfied by each variable.
    covers: Vec<Vec<usize>>,
    /// All costs are integers, so bounds can be rounded up.
    integral: bool,
}

impl CoverProblem {
    /// Reduces `problem` to covering form.
    ///
    /// Returns `Err(Infeasible)` for a row with no variables, or
    /// `Err(SolverError)` for anything outside covering form.
    fn from_problem(problem: &Problem) -> Result<Self, SolverStatus> {
        let num_vars = problem.num_vars();

        let mut costs = vec![0.0; num_vars];
        for &(var, coefficient) in &problem.objective.terms {
            let cost = costs.get_mut(var.index()).ok_or(SolverStatus::SolverError)?;
            *cost += coefficient;
        }
        if costs.iter().any(|cost| !cost.is_finite() || *cost < -EPSILON) {
            return Err(SolverStatus::SolverError);
        }
        for cost in &mut costs {
            *cost = cost.max(0.0);
        }
        let integral = costs.iter().all(|cost| (cost - cost.round()).abs() < EPSILON);

        let mut rows = Vec::with_capacity(problem.constraints.len());
        let mut merged = vec![0.0; num_vars];
        for constraint in &problem.constraints {
            if constraint.sense != Sense::Ge || constraint.rhs > 1.0 + EPSILON {
                return Err(SolverStatus::SolverError);
            }
            if constraint.rhs <= EPSILON {
                // binary variables with unit coefficients always satisfy this
                if constraint.expr.terms.iter().any(|&(_, c)| c < 0.0) {
                    return Err(SolverStatus::SolverError);
                }
                continue;
            }

            let mut row = Vec::with_capacity(constraint.expr.terms.len());
            for &(var, coefficient) in &constraint.expr.terms {
                let slot = merged.get_mut(var.index()).ok_or(SolverStatus::SolverError)?;
                if *slot == 0.0 {
                    row.push(var.index());
                }
                *slot += coefficient;
            }
            let unit = row.iter().all(|&var| (merged[var] - 1.0).abs() < EPSILON);
            for &var in &row {
                merged[var] = 0.0;
            }
            if !unit {
                return Err(SolverStatus::SolverError);
            }
            if row.is_empty() {
                return Err(SolverStatus::Infeasible);
            }
            rows.push(row);
        }

        let mut covers = vec![Vec::new(); num_vars];
        for (row_index, row) in rows.iter().enumerate() {
            for &var in row {
                covers[var].push(row_index);
            }
        }

        Ok(Self {
            costs,
            rows,
            covers,
            integral,
        })
    }
}

/// Raised when the node budget runs out.
struct NodeLimitReached;

/// Depth-first search state. Selections are applied and undone in place.
struct Search<'a> {
    problem: &'a CoverProblem,
    /// Number of selected variables covering each row.
    cover_count: Vec<u32>,
    forbidden: Vec<bool>,
    selected: Vec<usize>,
    /// Scratch: uncovered rows each variable would cover.
    gain: Vec<usize>,
    best_cost: f64,
    best: Option<Vec<usize>>,
    nodes: u64,
    node_limit: Option<u64>,
}

impl<'a> Search<'a> {
    fn new(problem: &'a CoverProblem, node_limit: Option<u64>) -> Self {
        let num_vars = problem.costs.len();
        let mut search = Self {
            problem,
            cover_count: vec![0; problem.rows.len()],
            forbidden: vec![false; num_vars],
            selected: Vec::new(),
            gain: vec![0; num_vars],
            best_cost: f64::INFINITY,
            best: None,
            nodes: 0,
            node_limit,
        };
        search.seed_with_greedy();
        search
    }

    /// Records a greedy cover as the starting incumbent.
    ///
    /// Repeatedly takes the variable with the lowest cost per newly covered row.
    fn seed_with_greedy(&mut self) {
        let problem = self.problem;
        let mut covered = vec![false; problem.rows.len()];
        let mut remaining = problem.rows.len();
        let mut picks = Vec::new();
        let mut cost = 0.0;

        while remaining > 0 {
            let mut pick: Option<(usize, f64)> = None;
            for (var, rows) in problem.covers.iter().enumerate() {
                let gain = rows.iter().filter(|&&row| !covered[row]).count();
                if gain == 0 {
                    continue;
                }
                let ratio = problem.costs[var] / gain as f64;
                if pick.map_or(true, |(_, best)| ratio < best - EPSILON) {
                    pick = Some((var, ratio));
                }
            }
            // every row has at least one variable, so this only ends once all are covered
            let Some((var, _)) = pick else { return };
            for &row in &problem.covers[var] {
                if !covered[row] {
                    covered[row] = true;
                    remaining -= 1;
                }
            }
            picks.push(var);
            cost += problem.costs[var];
        }

        self.best_cost = cost;
        self.best = Some(picks);
    }

    /// Whether a node with this lower bound can still beat the incumbent.
    fn can_improve(&self, lower_bound: f64) -> bool {
        let bound = if self.problem.integral {
            (lower_bound - EPSILON).ceil()
        } else {
            lower_bound
        };
        bound < self.best_cost - EPSILON
    }

    fn select(&mut self, var: usize) {
        for &row in &self.problem.covers[var] {
            self.cover_count[row] += 1;
        }
        self.selected.push(var);
    }

    fn deselect(&mut self, var: usize) {
        for &row in &self.problem.covers[var] {
            self.cover_count[row] -= 1;
        }
        self.selected.pop();
    }

    fn explore(&mut self, spent: f64) -> Result<(), NodeLimitReached> {
        self.nodes += 1;
        if self.node_limit.is_some_and(|limit| self.nodes > limit) {
            return Err(NodeLimitReached);
        }

        let problem = self.problem;
        for (var, rows) in problem.covers.iter().enumerate() {
            let gain = if self.forbidden[var] {
                0
            } else {
                rows.iter().filter(|&&row| self.cover_count[row] == 0).count()
            };
            self.gain[var] = gain;
        }

        // pick the most constrained uncovered row while summing the bound
        let mut branch_row: Option<(usize, usize)> = None;
        let mut lower_bound = spent;
        for (row, vars) in problem.rows.iter().enumerate() {
            if self.cover_count[row] > 0 {
                continue;
            }
            let mut options = 0;
            let mut cheapest = f64::INFINITY;
            for &var in vars {
                if self.forbidden[var] {
                    continue;
                }
                options += 1;
                cheapest = cheapest.min(problem.costs[var] / self.gain[var] as f64);
            }
            if options == 0 {
                return Ok(());
            }
            lower_bound += cheapest;
            if branch_row.map_or(true, |(_, fewest)| options < fewest) {
                branch_row = Some((row, options));
            }
        }

        let Some((row, _)) = branch_row else {
            if spent < self.best_cost - EPSILON {
                self.best_cost = spent;
                self.best = Some(self.selected.clone());
            }
            return Ok(());
        };
        if !self.can_improve(lower_bound) {
            return Ok(());
        }

        let mut tried = Vec::new();
        for &var in &problem.rows[row] {
            if self.forbidden[var] {
                continue;
            }
            self.select(var);
            let result = self.explore(spent + problem.costs[var]);
            self.deselect(var);
            result?;

            // later siblings never revisit this variable
            self.forbidden[var] = true;
            tried.push(var);
        }
        for var in tried {
            self.forbidden[var] = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, KnightModel, LinearExpr, VarId};

    fn cover_row(name: &str, vars: &[usize]) -> Constraint {
        Constraint {
            name: name.to_string(),
            expr: LinearExpr::sum(vars.iter().map(|&v| VarId(v))),
            sense: Sense::Ge,
            rhs: 1.0,
        }
    }

    fn problem_with(num_vars: usize, costs: &[f64], rows: &[&[usize]]) -> Problem {
        let mut problem = Problem::new("test");
        for i in 0..num_vars {
            problem.add_binary(format!("v{i}"));
        }
        for (i, &cost) in costs.iter().enumerate() {
            problem.objective.add_term(VarId(i), cost);
        }
        for (i, vars) in rows.iter().enumerate() {
            problem.constraints.push(cover_row(&format!("r{i}"), vars));
        }
        problem
    }

    fn solve_knights(size: usize) -> SolverOutcome {
        let model = KnightModel::build(size).unwrap();
        BranchAndBound::new().solve(model.problem()).unwrap()
    }

    fn knight_count(outcome: &SolverOutcome) -> f64 {
        assert_eq!(outcome.status, SolverStatus::Optimal);
        outcome.assignment.as_ref().unwrap().objective
    }

    #[test]
    fn test_small_boards_match_known_minimums() {
        // domination numbers of the n x n knight graph
        let known = [(1, 1.0), (2, 4.0), (3, 4.0), (4, 4.0), (5, 5.0), (6, 8.0)];
        for (size, expected) in known {
            assert_eq!(knight_count(&solve_knights(size)), expected, "size {size}");
        }
    }

    #[test]
    fn test_standard_board_needs_twelve() {
        let outcome = solve_knights(8);
        assert_eq!(knight_count(&outcome), 12.0);
        let values = &outcome.assignment.unwrap().values;
        assert_eq!(values.iter().filter(|&&v| v == 1.0).count(), 12);
    }

    #[test]
    fn test_solution_satisfies_every_row() {
        let model = KnightModel::build(7).unwrap();
        let outcome = BranchAndBound::new().solve(model.problem()).unwrap();
        let values = outcome.assignment.unwrap().values;
        assert!(model
            .problem()
            .constraints
            .iter()
            .all(|c| c.is_satisfied(&values)));
    }

    #[test]
    fn test_weighted_cover_prefers_cheaper_pair() {
        // v0 covers everything but costs more than v1 + v2
        let problem = problem_with(3, &[5.0, 1.0, 1.0], &[&[0, 1], &[0, 2]]);
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        let assignment = outcome.assignment.unwrap();
        assert_eq!(assignment.values, vec![0.0, 1.0, 1.0]);
        assert_eq!(assignment.objective, 2.0);
    }

    #[test]
    fn test_fractional_costs() {
        let problem = problem_with(3, &[0.6, 0.5, 0.5], &[&[0, 1], &[0, 2]]);
        let assignment = BranchAndBound::new().solve(&problem).unwrap().assignment.unwrap();
        assert_eq!(assignment.values, vec![1.0, 0.0, 0.0]);
        assert!((assignment.objective - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_row_is_infeasible() {
        let problem = problem_with(2, &[1.0, 1.0], &[&[0], &[]]);
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        assert_eq!(outcome, SolverOutcome::without_solution(SolverStatus::Infeasible));
    }

    #[test]
    fn test_non_covering_rows_are_rejected() {
        let mut problem = problem_with(2, &[1.0, 1.0], &[&[0, 1]]);
        problem.constraints[0].sense = Sense::Le;
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolverStatus::SolverError);

        let mut problem = problem_with(2, &[1.0, 1.0], &[&[0, 1]]);
        problem.constraints[0].rhs = 2.0;
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolverStatus::SolverError);

        let mut problem = problem_with(2, &[1.0, 1.0], &[&[0, 1]]);
        problem.constraints[0].expr.terms[1].1 = 3.0;
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolverStatus::SolverError);
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let problem = problem_with(2, &[-1.0, 1.0], &[&[0, 1]]);
        let outcome = BranchAndBound::new().solve(&problem).unwrap();
        assert_eq!(outcome.status, SolverStatus::SolverError);
    }

    #[test]
    fn test_trivial_rows_are_ignored() {
        let mut problem = problem_with(2, &[1.0, 1.0], &[&[0, 1], &[1]]);
        problem.constraints[0].rhs = 0.0;
        let assignment = BranchAndBound::new().solve(&problem).unwrap().assignment.unwrap();
        assert_eq!(assignment.values, vec![0.0, 1.0]);
    }

    #[test]
    fn test_node_limit_reports_not_solved() {
        let model = KnightModel::build(8).unwrap();
        let outcome = BranchAndBound::new()
            .with_node_limit(1)
            .solve(model.problem())
            .unwrap();
        assert_eq!(outcome, SolverOutcome::without_solution(SolverStatus::NotSolved));
    }

    #[test]
    fn test_no_rows_selects_nothing() {
        let problem = problem_with(3, &[1.0, 1.0, 1.0], &[]);
        let assignment = BranchAndBound::new().solve(&problem).unwrap().assignment.unwrap();
        assert_eq!(assignment.values, vec![0.0; 3]);
        assert_eq!(assignment.objective, 0.0);
    }
}
