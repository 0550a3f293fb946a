//! Knight Domination Solver
//!
//! Finds the minimum number of knights needed to occupy or attack every
//! square of a chessboard, and prints one placement that achieves it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use knights::board::DEFAULT_SIZE;
use knights::error::KnightsError;
use knights::model::KnightModel;
use knights::render;
use knights::solver::{BranchAndBound, CbcCommand, IlpSolver};

/// Solves the knight domination problem as a binary integer program.
#[derive(Parser)]
#[command(name = "knights")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Board size (the board is size x size).
    #[arg(short, long, default_value_t = DEFAULT_SIZE, global = true, value_parser = parse_size)]
    size: usize,

    /// Solver backend.
    #[arg(long, value_enum, default_value_t = Backend::BranchAndBound, global = true)]
    solver: Backend,

    /// Stop the branch-and-bound backend after this many search nodes.
    #[arg(long, global = true)]
    node_limit: Option<u64>,

    /// Time limit in seconds for the CBC backend.
    #[arg(long, global = true)]
    time_limit: Option<u64>,

    /// Path to the CBC executable.
    #[arg(long, default_value = "cbc", global = true)]
    cbc_path: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Solve and print the minimum placement (default).
    Solve,
    /// Print the integer program in CPLEX LP format.
    Lp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process branch-and-bound.
    BranchAndBound,
    /// External COIN-OR CBC executable.
    Cbc,
}

/// Parses a board size, rejecting zero.
fn parse_size(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) => Err("board size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    fn solver(&self) -> Box<dyn IlpSolver> {
        match self.solver {
            Backend::BranchAndBound => {
                let mut solver = BranchAndBound::new();
                if let Some(limit) = self.node_limit {
                    solver = solver.with_node_limit(limit);
                }
                Box::new(solver)
            }
            Backend::Cbc => {
                let mut solver = CbcCommand::new(&self.cbc_path);
                if let Some(seconds) = self.time_limit {
                    solver = solver.with_time_limit(seconds);
                }
                Box::new(solver)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Lp) => run_lp(cli.size),
        Some(Command::Solve) | None => run_solver(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&cli, &e);
            ExitCode::FAILURE
        }
    }
}

/// Solves the board and prints the report.
fn run_solver(cli: &Cli) -> Result<(), KnightsError> {
    let solver = cli.solver();
    let placement = knights::solve(cli.size, &solver)?;
    println!("{}", render::format_report(&placement));
    Ok(())
}

/// Prints the model in LP format.
fn run_lp(size: usize) -> Result<(), KnightsError> {
    let model = KnightModel::build(size)?;
    print!("{}", model.problem().to_lp());
    Ok(())
}

fn report_error(cli: &Cli, error: &KnightsError) {
    eprintln!("Error: {error}");
    match error {
        KnightsError::SolverUnavailable(_) => {
            eprintln!(
                "The {:?} backend could not be run. Install CBC or pass --solver branch-and-bound.",
                cli.solver
            );
        }
        KnightsError::Inconsistent { .. } | KnightsError::Decode(_) => {
            eprintln!("This indicates a modeling or solver integration bug.");
        }
        KnightsError::NoSolution { .. } => {
            eprintln!("Raise --node-limit or --time-limit to let the solver finish.");
        }
        KnightsError::Model(_) => {}
    }
}
